//! Lossy single-producer/single-consumer ring
//!
//! Decouples the ingress receive loop from the drain writer. The producer
//! side never waits: when the ring is full the oldest unread envelope is
//! evicted and counted. The consumer observes the surviving envelopes in
//! push order - an eviction produces a gap, never a reorder - and learns
//! how many envelopes were evicted since its previous read so the count
//! can be emitted as the `dropped` metric.
//!
//! The critical section is a couple of queue operations under a
//! `parking_lot` mutex; neither side ever holds it across I/O.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use sluice_protocol::logs::v1::Envelope;
use tokio::sync::Notify;

/// Default ring capacity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Factory for the producer/consumer pair.
pub struct Diode;

impl Diode {
    /// Create a ring with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> (DiodeProducer, DiodeConsumer) {
        assert!(capacity > 0, "diode capacity must be non-zero");

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                buf: VecDeque::with_capacity(capacity),
                dropped: 0,
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        });

        (
            DiodeProducer {
                shared: Arc::clone(&shared),
            },
            DiodeConsumer { shared },
        )
    }
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
    capacity: usize,
}

struct State {
    buf: VecDeque<Envelope>,
    dropped: u64,
    closed: bool,
}

/// Write half. Pushes never block and never fail.
pub struct DiodeProducer {
    shared: Arc<Shared>,
}

impl DiodeProducer {
    /// Push an envelope, evicting the oldest unread one when full.
    /// Pushes after `close` are discarded.
    pub fn push(&self, env: Envelope) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            if state.buf.len() == self.shared.capacity {
                state.buf.pop_front();
                state.dropped += 1;
            }
            state.buf.push_back(env);
        }
        self.shared.notify.notify_one();
    }

    /// Close the ring. The consumer drains what remains, then sees `None`.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.notify.notify_one();
    }
}

impl Drop for DiodeProducer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read half, owned by the drain task.
pub struct DiodeConsumer {
    shared: Arc<Shared>,
}

impl DiodeConsumer {
    /// Wait for the next envelope.
    ///
    /// Returns the envelope together with the number of evictions since
    /// the previous `next` call, or `None` once the ring is closed and
    /// drained.
    pub async fn next(&mut self) -> Option<(Envelope, u64)> {
        loop {
            {
                let mut state = self.shared.state.lock();
                if let Some(env) = state.buf.pop_front() {
                    let dropped = std::mem::take(&mut state.dropped);
                    return Some((env, dropped));
                }
                if state.closed {
                    return None;
                }
            }
            self.shared.notify.notified().await;
        }
    }
}

#[cfg(test)]
#[path = "diode_test.rs"]
mod diode_test;
