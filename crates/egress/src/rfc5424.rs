//! RFC 5424 frame encoding
//!
//! Pure mapping from a log-bus envelope to one newline-terminated
//! RFC 5424 message. No structured data element is emitted; receivers
//! frame on the trailing newline, not octet counting.
//!
//! Field mapping:
//!
//! | RFC 5424 field | Source |
//! |---|---|
//! | PRI | facility `user`, severity `info` for OUT / `error` for ERR |
//! | TIMESTAMP | envelope nanoseconds, RFC 3339 UTC |
//! | HOSTNAME | binding hostname |
//! | APP-NAME | application id |
//! | PROCID | `[SOURCE_TYPE]` or `[SOURCE_TYPE/instance]` |
//! | MSGID / SD | nil (`-`) |
//! | MSG | payload, NULs stripped, trailing `\n` ensured |

use chrono::{DateTime, SecondsFormat, Utc};
use sluice_protocol::logs::v1::{log, Envelope};

/// Syslog facility for user-level messages, per RFC 5424 section 6.2.1.
const FACILITY_USER: u8 = 1;

const SEVERITY_ERROR: u8 = 3;
const SEVERITY_INFO: u8 = 6;

/// Encode one envelope as an RFC 5424 frame.
///
/// Returns `None` for envelopes that carry no log body and for log types
/// this encoder does not know; callers drop those silently.
pub fn encode(env: &Envelope, hostname: &str, app_id: &str) -> Option<Vec<u8>> {
    let log = env.log()?;

    let severity = match log::Type::try_from(log.r#type) {
        Ok(log::Type::Out) => SEVERITY_INFO,
        Ok(log::Type::Err) => SEVERITY_ERROR,
        Err(_) => return None,
    };
    let priority = FACILITY_USER * 8 + severity;

    let timestamp = DateTime::<Utc>::from_timestamp_nanos(env.timestamp)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true);

    let msg = strip_nulls(&log.payload);

    let header = format!(
        "<{}>1 {} {} {} {} - - ",
        priority,
        timestamp,
        nil_if_empty(hostname),
        nil_if_empty(app_id),
        proc_id(env),
    );

    let mut frame = Vec::with_capacity(header.len() + msg.len() + 1);
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(&msg);
    if frame.last() != Some(&b'\n') {
        frame.push(b'\n');
    }

    Some(frame)
}

/// PROCID from the source tags: `[SOURCE_TYPE]`, or
/// `[SOURCE_TYPE/instance]` when a source instance is set.
fn proc_id(env: &Envelope) -> String {
    let source_type = env.tag_text("source_type").to_uppercase();
    let instance = env.tag_text("source_instance");
    if instance.is_empty() {
        format!("[{}]", source_type)
    } else {
        format!("[{}/{}]", source_type, instance)
    }
}

fn strip_nulls(payload: &[u8]) -> Vec<u8> {
    payload.iter().copied().filter(|&b| b != 0).collect()
}

fn nil_if_empty(field: &str) -> &str {
    if field.is_empty() {
        "-"
    } else {
        field
    }
}

#[cfg(test)]
#[path = "rfc5424_test.rs"]
mod rfc5424_test;
