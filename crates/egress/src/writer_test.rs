use super::*;
use parking_lot::Mutex;
use sluice_protocol::logs::v1::{envelope, log, value, Counter, Log, Value};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct CaptureEmitter {
    counters: Mutex<HashMap<String, u64>>,
}

impl CaptureEmitter {
    fn get(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }
}

impl MetricEmitter for CaptureEmitter {
    fn inc_counter(&self, name: &str, delta: u64) {
        *self.counters.lock().entry(name.to_string()).or_insert(0) += delta;
    }
}

fn log_envelope(payload: &[u8]) -> Envelope {
    let mut tags = HashMap::new();
    tags.insert(
        "source_type".to_string(),
        Value {
            data: Some(value::Data::Text("app".to_string())),
        },
    );
    tags.insert(
        "source_instance".to_string(),
        Value {
            data: Some(value::Data::Text("7".to_string())),
        },
    );
    Envelope {
        timestamp: 0,
        source_id: "app-guid".to_string(),
        tags,
        message: Some(envelope::Message::Log(Log {
            payload: payload.to_vec(),
            r#type: log::Type::Out as i32,
        })),
        ..Default::default()
    }
}

fn binding(drain: &str) -> Binding {
    Binding {
        app_id: "app-guid".to_string(),
        hostname: "host.example".to_string(),
        drain: drain.to_string(),
    }
}

fn writer_for(host: &str, dialer: Arc<dyn Dialer>, emitter: Arc<CaptureEmitter>) -> DrainWriter {
    DrainWriter::new(
        host.to_string(),
        &binding("syslog://unused/"),
        dialer,
        WriterConfig {
            dial_timeout: Duration::from_millis(200),
            io_timeout: Duration::from_secs(1),
        },
        CancellationToken::new(),
        emitter,
    )
}

/// Connection whose writes always fail with a broken pipe.
struct BrokenConn;

impl AsyncWrite for BrokenConn {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Dialer that hands out a broken connection first, then working ones,
/// counting every dial.
struct FlakyDialer {
    dials: AtomicUsize,
}

#[async_trait]
impl Dialer for FlakyDialer {
    async fn dial(&self, _host: &str) -> io::Result<Conn> {
        let attempt = self.dials.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            Ok(Box::new(BrokenConn))
        } else {
            Ok(Box::new(tokio::io::sink()))
        }
    }
}

/// Dialer that always fails immediately.
struct RefusingDialer;

#[async_trait]
impl Dialer for RefusingDialer {
    async fn dial(&self, _host: &str) -> io::Result<Conn> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    }
}

// =============================================================================
// Delivery
// =============================================================================

#[tokio::test]
async fn test_write_delivers_rfc5424_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });

    let emitter = Arc::new(CaptureEmitter::default());
    let mut writer = writer_for(&addr.to_string(), Arc::new(TcpDialer), Arc::clone(&emitter));

    writer.write(&log_envelope(b"hello")).await.unwrap();
    writer.close().await;

    let received = server.await.unwrap();
    assert_eq!(
        String::from_utf8(received).unwrap(),
        "<14>1 1970-01-01T00:00:00Z host.example app-guid [APP/7] - - hello\n"
    );
    assert_eq!(emitter.get("egress"), 1);
}

#[tokio::test]
async fn test_one_frame_per_envelope() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });

    let emitter = Arc::new(CaptureEmitter::default());
    let mut writer = writer_for(&addr.to_string(), Arc::new(TcpDialer), Arc::clone(&emitter));

    for i in 0..3 {
        writer
            .write(&log_envelope(format!("line {i}").as_bytes()))
            .await
            .unwrap();
    }
    writer.close().await;

    let received = String::from_utf8(server.await.unwrap()).unwrap();
    assert_eq!(received.matches('\n').count(), 3);
    assert_eq!(emitter.get("egress"), 3);
}

#[tokio::test]
async fn test_non_log_envelope_succeeds_without_dialing() {
    // The dialer would fail if it were ever consulted.
    let emitter = Arc::new(CaptureEmitter::default());
    let mut writer = writer_for("127.0.0.1:1", Arc::new(RefusingDialer), Arc::clone(&emitter));

    let env = Envelope {
        message: Some(envelope::Message::Counter(Counter::default())),
        ..Default::default()
    };

    writer.write(&env).await.unwrap();
    assert_eq!(emitter.get("egress"), 0);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_failed_write_discards_connection_and_redials() {
    let emitter = Arc::new(CaptureEmitter::default());
    let dialer = Arc::new(FlakyDialer {
        dials: AtomicUsize::new(0),
    });
    let mut writer = writer_for("127.0.0.1:1", Arc::clone(&dialer) as Arc<dyn Dialer>, emitter);

    // First write lands on the broken connection.
    let err = writer.write(&log_envelope(b"x")).await.unwrap_err();
    assert!(matches!(err, EgressError::Io(_)));

    // The connection was discarded, so the next write dials again and
    // succeeds.
    writer.write(&log_envelope(b"y")).await.unwrap();
    assert_eq!(dialer.dials.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancelled_dial_fails_without_backoff() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut writer = DrainWriter::new(
        "127.0.0.1:1".to_string(),
        &binding("syslog://unused/"),
        Arc::new(RefusingDialer),
        WriterConfig::default(),
        cancel,
        Arc::new(CaptureEmitter::default()),
    );

    // Without the cancellation this would sleep 60 s between attempts.
    let err = tokio::time::timeout(Duration::from_secs(1), writer.write(&log_envelope(b"x")))
        .await
        .expect("dial error should be immediate when cancelled")
        .unwrap_err();
    assert!(matches!(err, EgressError::Dial { .. }));
}

#[tokio::test]
async fn test_cancel_during_backoff_unblocks() {
    let cancel = CancellationToken::new();
    let mut writer = DrainWriter::new(
        "127.0.0.1:1".to_string(),
        &binding("syslog://unused/"),
        Arc::new(RefusingDialer),
        WriterConfig::default(),
        cancel.clone(),
        Arc::new(CaptureEmitter::default()),
    );

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), writer.write(&log_envelope(b"x")))
        .await
        .expect("cancel should interrupt the backoff sleep")
        .unwrap_err();
    assert!(matches!(err, EgressError::Dial { .. }));

    canceller.await.unwrap();
}

// =============================================================================
// Close semantics
// =============================================================================

#[tokio::test]
async fn test_write_after_close_fails() {
    let emitter = Arc::new(CaptureEmitter::default());
    let mut writer = writer_for("127.0.0.1:1", Arc::new(RefusingDialer), emitter);

    writer.close().await;

    let err = writer.write(&log_envelope(b"x")).await.unwrap_err();
    assert!(matches!(err, EgressError::WriterClosed));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let emitter = Arc::new(CaptureEmitter::default());
    let mut writer = writer_for("127.0.0.1:1", Arc::new(RefusingDialer), emitter);

    writer.close().await;
    writer.close().await;

    let err = writer.write(&log_envelope(b"x")).await.unwrap_err();
    assert!(matches!(err, EgressError::WriterClosed));
}
