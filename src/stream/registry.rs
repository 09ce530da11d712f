//! Periodic publish/subscribe dispatcher for named metric streams.
//!
//! The registry knows nothing about the payloads it carries. Each stream key
//! maps to a generator; the first subscriber to a stream gets an immediate
//! sample and arms a repeating timer task, and the last one to leave aborts
//! it again.

use crate::core::error::StreamError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

/// Period between two samples of the same stream.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Subscriber callback. Handlers are compared by `Arc` identity on unsubscribe.
pub type Handler<P> = Arc<dyn Fn(&P) -> anyhow::Result<()> + Send + Sync>;

/// Produces one payload per tick.
pub type Generator<P> = Arc<dyn Fn() -> P + Send + Sync>;

struct StreamState<P> {
    handlers: Vec<Handler<P>>,
    timer: Option<JoinHandle<()>>,
}

struct Inner<K, P> {
    generators: HashMap<K, Generator<P>>,
    streams: Mutex<HashMap<K, StreamState<P>>>,
    period: Duration,
}

impl<K, P> Inner<K, P>
where
    K: Eq + Hash + Clone + Debug,
{
    fn streams(&self) -> MutexGuard<'_, HashMap<K, StreamState<P>>> {
        // The lock is never held across handler calls, so a poisoned guard
        // still protects a consistent table.
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `payload` to a snapshot of the current handlers, in
    /// registration order. Returns how many handlers completed successfully.
    fn publish(&self, stream: &K, payload: &P) -> usize {
        let snapshot: Vec<Handler<P>> = match self.streams().get(stream) {
            Some(state) => state.handlers.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for (index, handler) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(?stream, handler = index, error = %e, "Stream handler failed");
                }
                Err(_) => {
                    warn!(?stream, handler = index, "Stream handler panicked");
                }
            }
        }
        delivered
    }
}

impl<K, P> Drop for Inner<K, P> {
    fn drop(&mut self) {
        let streams = self.streams.get_mut().unwrap_or_else(PoisonError::into_inner);
        for state in streams.values_mut() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
    }
}

/// Cheaply cloneable handle to a set of periodically generated streams.
pub struct StreamRegistry<K, P> {
    inner: Arc<Inner<K, P>>,
}

impl<K, P> Clone for StreamRegistry<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, P> StreamRegistry<K, P>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    pub fn new(period: Duration, generators: HashMap<K, Generator<P>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                generators,
                streams: Mutex::new(HashMap::new()),
                period,
            }),
        }
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Registers `handler` on `stream`.
    ///
    /// The first handler of a stream arms its timer and receives a sample
    /// synchronously before this call returns. Later handlers wait for the
    /// next tick.
    pub fn subscribe(&self, stream: K, handler: Handler<P>) -> Result<(), StreamError> {
        let generator = self
            .inner
            .generators
            .get(&stream)
            .cloned()
            .ok_or_else(|| StreamError::UnknownStream(format!("{stream:?}")))?;

        let armed_now = {
            let mut streams = self.inner.streams();
            let state = streams.entry(stream.clone()).or_insert_with(|| StreamState {
                handlers: Vec::new(),
                timer: None,
            });

            if state.timer.is_none() {
                let runtime = match Handle::try_current() {
                    Ok(runtime) => runtime,
                    Err(_) => {
                        if state.handlers.is_empty() {
                            streams.remove(&stream);
                        }
                        return Err(StreamError::NoRuntime);
                    }
                };
                let timer = self.spawn_timer(&runtime, stream.clone(), Arc::clone(&generator));
                state.timer = Some(timer);
                state.handlers.push(handler);
                true
            } else {
                state.handlers.push(handler);
                false
            }
        };

        if armed_now {
            debug!(?stream, period = ?self.inner.period, "Armed stream timer");
            let payload = generator();
            self.inner.publish(&stream, &payload);
        } else {
            debug!(?stream, "Added subscriber to active stream");
        }
        Ok(())
    }

    /// Removes `handler` from `stream`. Returns `false` if it was not registered.
    ///
    /// Removing the last handler aborts the stream's timer.
    pub fn unsubscribe(&self, stream: &K, handler: &Handler<P>) -> bool {
        let mut streams = self.inner.streams();
        let Some(state) = streams.get_mut(stream) else {
            return false;
        };

        let before = state.handlers.len();
        state.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = state.handlers.len() < before;

        if state.handlers.is_empty() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            streams.remove(stream);
            debug!(?stream, "Stopped stream timer");
        }
        removed
    }

    /// Publishes one freshly generated sample to the current subscribers of
    /// `stream`, outside the timer schedule.
    pub fn publish_now(&self, stream: &K) -> Result<usize, StreamError> {
        let generator = self
            .inner
            .generators
            .get(stream)
            .ok_or_else(|| StreamError::UnknownStream(format!("{stream:?}")))?;
        let payload = generator();
        Ok(self.inner.publish(stream, &payload))
    }

    pub fn subscriber_count(&self, stream: &K) -> usize {
        self.inner
            .streams()
            .get(stream)
            .map_or(0, |state| state.handlers.len())
    }

    pub fn is_active(&self, stream: &K) -> bool {
        self.inner
            .streams()
            .get(stream)
            .is_some_and(|state| state.timer.is_some())
    }

    pub fn active_streams(&self) -> Vec<K> {
        self.inner
            .streams()
            .iter()
            .filter(|(_, state)| state.timer.is_some())
            .map(|(stream, _)| stream.clone())
            .collect()
    }

    fn spawn_timer(&self, runtime: &Handle, stream: K, generator: Generator<P>) -> JoinHandle<()> {
        let period = self.inner.period;
        let inner: Weak<Inner<K, P>> = Arc::downgrade(&self.inner);

        runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let payload = generator();
                let delivered = inner.publish(&stream, &payload);
                debug!(?stream, delivered, "Stream tick");
            }
        })
    }
}
