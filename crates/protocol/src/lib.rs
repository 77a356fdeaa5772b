//! Sluice wire types
//!
//! Generated protobuf/gRPC types for the two wire surfaces of the system:
//!
//! - `logs::v1` - the platform log bus: `Envelope` records and the
//!   `Egress` streaming subscription service.
//! - `adapter::v1` - the control plane the scheduler drives: `Binding`
//!   tuples and the `Adapter` service (list/create/delete).
//!
//! Everything here is produced by `tonic-build` from the `.proto` files in
//! `proto/`; this crate adds only small accessor helpers on top.

pub mod logs {
    pub mod v1 {
        tonic::include_proto!("sluice.logs.v1");
    }
}

pub mod adapter {
    pub mod v1 {
        tonic::include_proto!("sluice.adapter.v1");
    }
}

use logs::v1::{envelope, value, Envelope, Log};

impl Envelope {
    /// Returns the log body, or `None` for counter/gauge/timer envelopes.
    pub fn log(&self) -> Option<&Log> {
        match self.message {
            Some(envelope::Message::Log(ref log)) => Some(log),
            _ => None,
        }
    }

    /// Returns the text value of a tag, or `""` when the tag is absent or
    /// not a text value.
    pub fn tag_text(&self, name: &str) -> &str {
        match self.tags.get(name) {
            Some(v) => match v.data {
                Some(value::Data::Text(ref text)) => text,
                _ => "",
            },
            None => "",
        }
    }
}

impl adapter::v1::Binding {
    /// Shard key for the log-bus subscription. All replicas of one binding
    /// share the key, so the bus splits the stream between them instead of
    /// duplicating it.
    ///
    /// The fields are concatenated without a separator; pathological
    /// app/hostname values can collide. Kept for wire compatibility with
    /// existing deployments.
    pub fn shard_id(&self) -> String {
        let mut id =
            String::with_capacity(self.app_id.len() + self.hostname.len() + self.drain.len());
        id.push_str(&self.app_id);
        id.push_str(&self.hostname);
        id.push_str(&self.drain);
        id
    }
}

impl std::fmt::Display for adapter::v1::Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.app_id, self.drain)
    }
}
