//! Debounced update dispatcher
//!
//! Coalesces rapid edits of one parameter into a single outbound update.
//! Each parameter address has at most one scheduled task in an explicit map;
//! scheduling again aborts it and starts a new quiet interval. A generation
//! number recorded with each entry keeps a superseded task from sending even
//! if it wakes before the abort lands.
//!
//! Failed sends are logged and reported; they are not retried, and nothing is
//! reverted locally. Outcomes are reported without waiting: when the outcome
//! channel is full the outcome is logged and dropped, so neither a timer task
//! nor [`UpdateDispatcher::flush`] ever blocks on a slow receiver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pedit_core::ParameterAddress;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::config::DEFAULT_QUIET_INTERVAL_MS;
use crate::error::TransportError;
use crate::transport::ParameterTransport;
use crate::types::ParameterUpdate;

/// Quiet interval used when none is configured
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(DEFAULT_QUIET_INTERVAL_MS);

/// Result of one delivered update
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Update that was sent
    pub update: ParameterUpdate,
    /// Transport result
    pub result: Result<(), TransportError>,
}

impl DispatchOutcome {
    /// Check if the remote side accepted the update
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

struct ScheduledDispatch {
    generation: u64,
    update: ParameterUpdate,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Schedule {
    next_generation: u64,
    entries: HashMap<ParameterAddress, ScheduledDispatch>,
}

/// Debounced sender of parameter updates
pub struct UpdateDispatcher {
    transport: Arc<dyn ParameterTransport>,
    quiet_interval: Duration,
    schedule: Arc<Mutex<Schedule>>,
    outcomes: Option<mpsc::Sender<DispatchOutcome>>,
}

impl UpdateDispatcher {
    /// Create dispatcher with the default quiet interval
    #[must_use]
    pub fn new(transport: Arc<dyn ParameterTransport>) -> Self {
        Self {
            transport,
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            schedule: Arc::new(Mutex::new(Schedule::default())),
            outcomes: None,
        }
    }

    /// With quiet interval
    #[inline]
    #[must_use]
    pub fn with_quiet_interval(mut self, interval: Duration) -> Self {
        self.quiet_interval = interval;
        self
    }

    /// With channel receiving every outcome
    ///
    /// Outcomes that find the channel full are dropped with a warning.
    #[inline]
    #[must_use]
    pub fn with_outcomes(mut self, sender: mpsc::Sender<DispatchOutcome>) -> Self {
        self.outcomes = Some(sender);
        self
    }

    /// Quiet interval in use
    #[inline]
    #[must_use]
    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }

    /// Schedule an update, superseding any pending one for the same address
    ///
    /// Must be called within a tokio runtime.
    pub fn schedule(&self, update: ParameterUpdate) {
        let mut schedule = self.schedule.lock();
        schedule.next_generation += 1;
        let generation = schedule.next_generation;

        if let Some(previous) = schedule.entries.remove(&update.address) {
            previous.handle.abort();
            tracing::debug!(
                "Superseded pending update of {} ({} -> {})",
                update.address,
                previous.update.value,
                update.value
            );
        } else {
            tracing::debug!("Scheduled update of {} = {}", update.address, update.value);
        }

        let handle = tokio::spawn(dispatch_after_quiet(
            self.quiet_interval,
            generation,
            update.address.clone(),
            Arc::clone(&self.schedule),
            Arc::clone(&self.transport),
            self.outcomes.clone(),
        ));
        schedule.entries.insert(
            update.address.clone(),
            ScheduledDispatch {
                generation,
                update,
                handle,
            },
        );
    }

    /// Send every pending update now, in no particular order
    pub async fn flush(&self) {
        let pending: Vec<ParameterUpdate> = {
            let mut schedule = self.schedule.lock();
            schedule
                .entries
                .drain()
                .map(|(_, entry)| {
                    entry.handle.abort();
                    entry.update
                })
                .collect()
        };
        if !pending.is_empty() {
            tracing::debug!("Flushing {} pending updates", pending.len());
        }
        for update in pending {
            deliver(self.transport.as_ref(), update, self.outcomes.as_ref()).await;
        }
    }

    /// Drop every pending update without sending
    pub fn cancel_all(&self) {
        let mut schedule = self.schedule.lock();
        for (address, entry) in schedule.entries.drain() {
            entry.handle.abort();
            tracing::debug!("Cancelled pending update of {}", address);
        }
    }

    /// Number of updates waiting for their quiet interval
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.schedule.lock().entries.len()
    }

    /// Check if an update for `address` is waiting
    #[must_use]
    pub fn is_scheduled(&self, address: &ParameterAddress) -> bool {
        self.schedule.lock().entries.contains_key(address)
    }
}

impl Drop for UpdateDispatcher {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for UpdateDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDispatcher")
            .field("quiet_interval", &self.quiet_interval)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

async fn dispatch_after_quiet(
    quiet_interval: Duration,
    generation: u64,
    address: ParameterAddress,
    schedule: Arc<Mutex<Schedule>>,
    transport: Arc<dyn ParameterTransport>,
    outcomes: Option<mpsc::Sender<DispatchOutcome>>,
) {
    tokio::time::sleep(quiet_interval).await;

    let update = {
        let mut schedule = schedule.lock();
        match schedule.entries.get(&address) {
            Some(entry) if entry.generation == generation => {
                schedule.entries.remove(&address).map(|entry| entry.update)
            }
            _ => None,
        }
    };
    match update {
        Some(update) => deliver(transport.as_ref(), update, outcomes.as_ref()).await,
        None => tracing::debug!("Dropped superseded update of {}", address),
    }
}

async fn deliver(
    transport: &dyn ParameterTransport,
    update: ParameterUpdate,
    outcomes: Option<&mpsc::Sender<DispatchOutcome>>,
) {
    let result = transport.set_parameters(&update).await;
    match &result {
        Ok(()) => tracing::info!("Dispatched {} = {}", update.address, update.value),
        Err(e) => tracing::error!("Failed to dispatch {} = {}: {}", update.address, update.value, e),
    }
    if let Some(sender) = outcomes {
        match sender.try_send(DispatchOutcome { update, result }) {
            Ok(()) => {}
            Err(TrySendError::Full(outcome)) => tracing::warn!(
                "Dispatch outcome channel full, dropping outcome of {}",
                outcome.update.address
            ),
            Err(TrySendError::Closed(_)) => tracing::debug!("Dispatch outcome receiver dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedit_core::ParameterValue;

    #[derive(Default)]
    struct CountingTransport {
        sent: Mutex<Vec<ParameterUpdate>>,
    }

    #[async_trait::async_trait]
    impl ParameterTransport for CountingTransport {
        async fn set_parameters(&self, update: &ParameterUpdate) -> Result<(), TransportError> {
            self.sent.lock().push(update.clone());
            Ok(())
        }
    }

    fn gain(value: f64) -> ParameterUpdate {
        ParameterUpdate::new(
            ParameterAddress::new("camera", "gain"),
            ParameterValue::Double(value),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_coalesces_to_last_value() {
        let transport = Arc::new(CountingTransport::default());
        let dispatcher = UpdateDispatcher::new(transport.clone());

        for value in [1.0, 2.0, 3.0] {
            dispatcher.schedule(gain(value));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(transport.sent.lock().is_empty());
        assert_eq!(dispatcher.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*transport.sent.lock(), vec![gain(3.0)]);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_flush_sends_immediately() {
        let transport = Arc::new(CountingTransport::default());
        let dispatcher = UpdateDispatcher::new(transport.clone());
        dispatcher.schedule(gain(4.0));
        dispatcher.flush().await;
        assert_eq!(*transport.sent.lock(), vec![gain(4.0)]);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(transport.sent.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_cancel_all_sends_nothing() {
        let transport = Arc::new(CountingTransport::default());
        let dispatcher = UpdateDispatcher::new(transport.clone());
        dispatcher.schedule(gain(4.0));
        assert!(dispatcher.is_scheduled(&ParameterAddress::new("camera", "gain")));
        dispatcher.cancel_all();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_reports_outcomes() {
        let transport = Arc::new(CountingTransport::default());
        let (tx, mut rx) = mpsc::channel(4);
        let dispatcher = UpdateDispatcher::new(transport)
            .with_quiet_interval(Duration::from_millis(10))
            .with_outcomes(tx);
        dispatcher.schedule(gain(1.5));

        let outcome = rx.recv().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.update, gain(1.5));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_flush_does_not_wait_on_full_outcome_channel() {
        let transport = Arc::new(CountingTransport::default());
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = UpdateDispatcher::new(transport.clone())
            .with_quiet_interval(Duration::from_millis(10))
            .with_outcomes(tx);

        dispatcher.schedule(gain(1.0));
        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.schedule(gain(2.0));
        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.schedule(gain(3.0));

        tokio::time::timeout(Duration::from_secs(1), dispatcher.flush())
            .await
            .unwrap();
        assert_eq!(transport.sent.lock().len(), 3);
        assert_eq!(rx.recv().await.unwrap().update, gain(1.0));
        assert!(rx.try_recv().is_err());
    }
}
