//! Polling notification sync engine.
//!
//! One engine instance per session owns its lifecycle (`Idle`/`Polling`),
//! its ordered subscriber list and the rolling [`NotificationSnapshot`].
//! Each reconciliation cycle reads the three slices concurrently through
//! the [`NotificationFeed`], keeps the last good value of any slice that
//! failed, flags whether any count moved, fans the result out to every
//! subscriber in registration order and only then updates the snapshot.
//! Cycles are serialised, so no cycle ever observes a half-updated
//! snapshot.

use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use courtyard_domain::{
    ClientSettings, Notification, NotificationSnapshot, PollingState, RequestResult, Slice,
    SyncCycle,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::push::{PushRegistrar, PushRegistrationError};
use crate::ports::{ForegroundListener, ListenerHandle, NotificationFeed};

/// Outcome of one subscriber invocation.
pub type SubscriberResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Callback receiving every cycle result while polling.
pub type Subscriber = Arc<dyn Fn(&SyncCycle) -> SubscriberResult + Send + Sync>;

/// Identifies one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// Polling cadence and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Time between timer-driven cycles.
    pub interval: Duration,
    /// Page size for the notifications and announcements reads.
    pub page_size: u32,
}

impl PollingConfig {
    /// Takes the interval and page size from settings.
    #[must_use]
    pub const fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            page_size: settings.page_size,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            page_size: 20,
        }
    }
}

enum Lifecycle {
    Idle,
    Polling {
        stop: CancellationToken,
        timer: JoinHandle<()>,
    },
}

#[derive(Default)]
struct SyncView {
    snapshot: NotificationSnapshot,
    notifications: Vec<Notification>,
    announcements: Vec<Notification>,
}

struct EngineInner {
    feed: Arc<dyn NotificationFeed>,
    config: PollingConfig,
    lifecycle: Mutex<Lifecycle>,
    subscribers: Mutex<Vec<(SubscriptionHandle, Subscriber)>>,
    view: Mutex<SyncView>,
    cycle_gate: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
}

/// Keeps a rolling view of server notification state by polling.
#[derive(Clone)]
pub struct NotificationSyncEngine {
    inner: Arc<EngineInner>,
    push: Option<Arc<PushRegistrar>>,
}

impl NotificationSyncEngine {
    /// Creates an idle engine reading through `feed`.
    pub fn new(feed: Arc<dyn NotificationFeed>, config: PollingConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                feed,
                config,
                lifecycle: Mutex::new(Lifecycle::Idle),
                subscribers: Mutex::new(Vec::new()),
                view: Mutex::new(SyncView::default()),
                cycle_gate: tokio::sync::Mutex::new(()),
                next_id: AtomicU64::new(1),
            }),
            push: None,
        }
    }

    /// Enables the push-token and foreground-listener operations.
    #[must_use]
    pub fn with_push(mut self, registrar: PushRegistrar) -> Self {
        self.push = Some(Arc::new(registrar));
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollingState {
        match *self.inner.lifecycle.lock() {
            Lifecycle::Idle => PollingState::Idle,
            Lifecycle::Polling { .. } => PollingState::Polling,
        }
    }

    /// Last recorded slice counts.
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.inner.view.lock().snapshot
    }

    /// Registers `subscriber` and starts polling if idle.
    ///
    /// The first call runs one cycle before returning, then arms the
    /// timer. Calling again while polling only adds the subscriber; there
    /// is never more than one timer.
    pub async fn start_polling(&self, subscriber: Subscriber) -> SubscriptionHandle {
        let handle = self.inner.add_subscriber(subscriber);

        let stop = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if matches!(*lifecycle, Lifecycle::Polling { .. }) {
                debug!(?handle, "already polling; subscriber added");
                return handle;
            }
            let stop = CancellationToken::new();
            let timer = tokio::spawn(run_timer(
                Arc::downgrade(&self.inner),
                self.inner.config.interval,
                stop.clone(),
            ));
            *lifecycle = Lifecycle::Polling {
                stop: stop.clone(),
                timer,
            };
            stop
        };

        info!(
            interval_secs = self.inner.config.interval.as_secs(),
            "notification polling started"
        );
        self.inner.run_cycle(Some(&stop)).await;
        handle
    }

    /// Cancels the timer, clears subscribers and zeroes the snapshot.
    /// A no-op while idle.
    pub fn stop_polling(&self) {
        let previous = std::mem::replace(&mut *self.inner.lifecycle.lock(), Lifecycle::Idle);
        let Lifecycle::Polling { stop, timer } = previous else {
            debug!("stop requested while idle");
            return;
        };

        stop.cancel();
        timer.abort();
        self.inner.subscribers.lock().clear();
        *self.inner.view.lock() = SyncView::default();
        info!("notification polling stopped");
    }

    /// Removes one subscriber without stopping the timer. Returns whether
    /// it was registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(h, _)| *h != handle);
        before != subscribers.len()
    }

    /// Runs one cycle now and returns its result.
    ///
    /// While polling this behaves exactly like a timer tick. While idle the
    /// result is computed against the current snapshot but nothing is
    /// fanned out or recorded.
    pub async fn sync_now(&self) -> SyncCycle {
        let stop = match &*self.inner.lifecycle.lock() {
            Lifecycle::Polling { stop, .. } => Some(stop.clone()),
            Lifecycle::Idle => None,
        };
        self.inner.run_cycle(stop.as_ref()).await
    }

    /// Requests permission, obtains a device token and submits it.
    ///
    /// Returns `Ok(None)` when push is not configured or permission was
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns an error when token acquisition or submission exhausted
    /// its attempts.
    pub async fn register_for_push_notifications(
        &self,
    ) -> Result<Option<String>, PushRegistrationError> {
        match &self.push {
            Some(registrar) => registrar.register().await,
            None => {
                debug!("push registration skipped: no push platform configured");
                Ok(None)
            }
        }
    }

    /// Installs a foreground push listener. The caller owns the handle.
    pub fn add_foreground_listener(&self, listener: ForegroundListener) -> Option<ListenerHandle> {
        let registrar = self.push.as_ref()?;
        match registrar.platform().add_foreground_listener(listener) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not install foreground listener");
                None
            }
        }
    }

    /// Releases a listener handle. `None` is ignored.
    pub fn remove_listener(&self, handle: Option<ListenerHandle>) {
        if let (Some(handle), Some(registrar)) = (handle, &self.push) {
            registrar.platform().remove_listener(handle);
        }
    }
}

impl EngineInner {
    fn add_subscriber(&self, subscriber: Subscriber) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((handle, subscriber));
        handle
    }

    /// `stop` is the polling generation's token; `None` means a detached
    /// read with no fan-out and no snapshot update.
    async fn run_cycle(&self, stop: Option<&CancellationToken>) -> SyncCycle {
        let _gate = self.cycle_gate.lock().await;
        let started = Instant::now();

        let page = self.config.page_size;
        let (notifications, announcements, unread) = tokio::join!(
            self.feed.notifications(1, page),
            self.feed.announcements(1, page),
            self.feed.unread_count(),
        );

        let cycle = {
            let view = self.view.lock();
            reconcile(&view, notifications, announcements, unread)
        };
        debug!(
            has_changes = cycle.has_changes,
            stale = cycle.stale_slices.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "reconciliation cycle finished"
        );

        let Some(stop) = stop else {
            return cycle;
        };
        if stop.is_cancelled() {
            debug!("polling stopped mid-cycle; result discarded");
            return cycle;
        }

        self.fan_out(&cycle);

        let mut view = self.view.lock();
        if !stop.is_cancelled() {
            view.snapshot = cycle.snapshot();
            view.notifications.clone_from(&cycle.notifications);
            view.announcements.clone_from(&cycle.announcements);
        }
        drop(view);
        cycle
    }

    fn fan_out(&self, cycle: &SyncCycle) {
        let subscribers: Vec<(SubscriptionHandle, Subscriber)> = self.subscribers.lock().clone();
        for (handle, subscriber) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber(cycle))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(?handle, error = %e, "subscriber failed"),
                Err(_) => warn!(?handle, "subscriber panicked"),
            }
        }
    }
}

fn reconcile(
    view: &SyncView,
    notifications: RequestResult<Vec<Notification>>,
    announcements: RequestResult<Vec<Notification>>,
    unread: RequestResult<u64>,
) -> SyncCycle {
    let mut stale_slices = Vec::new();
    let mut keep_last = |slice: Slice, error: &dyn std::fmt::Display| {
        warn!(%slice, %error, "slice read failed; keeping last known value");
        stale_slices.push(slice);
    };

    let notifications = notifications.unwrap_or_else(|e| {
        keep_last(Slice::Notifications, &e);
        view.notifications.clone()
    });
    let announcements = announcements.unwrap_or_else(|e| {
        keep_last(Slice::Announcements, &e);
        view.announcements.clone()
    });
    let unread_count = unread.unwrap_or_else(|e| {
        keep_last(Slice::UnreadCount, &e);
        view.snapshot.unread
    });

    let mut cycle = SyncCycle {
        notifications,
        announcements,
        unread_count,
        has_changes: false,
        stale_slices,
    };
    cycle.has_changes = !cycle.snapshot().changed_since(&view.snapshot).is_empty();
    cycle
}

async fn run_timer(inner: Weak<EngineInner>, period: Duration, stop: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                inner.run_cycle(Some(&stop)).await;
            }
        }
    }
    debug!("polling timer exited");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notifications::NotificationApi;
    use crate::ports::ForegroundEvent;
    use crate::test_support::{CannedTransport, InMemoryCredentials, executor};
    use async_trait::async_trait;
    use courtyard_domain::{CredentialScope, ErrorKind, RawResponse, RequestFailure};
    use serde_json::json;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Feed replaying scripted counts; an empty script repeats the last value.
    #[derive(Default)]
    struct ScriptedFeed {
        notifications: Mutex<VecDeque<RequestResult<usize>>>,
        announcements: Mutex<VecDeque<RequestResult<usize>>>,
        unread: Mutex<VecDeque<RequestResult<u64>>>,
        reads: AtomicUsize,
    }

    impl ScriptedFeed {
        fn counts(n: &[usize], a: &[usize], u: &[u64]) -> Self {
            Self {
                notifications: Mutex::new(n.iter().copied().map(Ok).collect()),
                announcements: Mutex::new(a.iter().copied().map(Ok).collect()),
                unread: Mutex::new(u.iter().copied().map(Ok).collect()),
                reads: AtomicUsize::new(0),
            }
        }

        fn next<T: Clone>(queue: &Mutex<VecDeque<RequestResult<T>>>) -> RequestResult<T> {
            let mut queue = queue.lock();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }

        fn cycles(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    fn items(count: usize) -> Vec<Notification> {
        (0..count)
            .map(|i| Notification {
                id: format!("n{i}"),
                title: String::new(),
                message: String::new(),
                kind: None,
                is_read: false,
                created_at: None,
            })
            .collect()
    }

    fn offline() -> RequestFailure {
        RequestFailure::network_unreachable()
    }

    #[async_trait]
    impl NotificationFeed for ScriptedFeed {
        async fn notifications(&self, _page: u32, _limit: u32) -> RequestResult<Vec<Notification>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Self::next(&self.notifications).map(items)
        }

        async fn announcements(&self, _page: u32, _limit: u32) -> RequestResult<Vec<Notification>> {
            Self::next(&self.announcements).map(items)
        }

        async fn unread_count(&self) -> RequestResult<u64> {
            Self::next(&self.unread)
        }

        async fn register_push_token(&self, _token: &str) -> RequestResult<()> {
            Ok(())
        }
    }

    type Seen = Arc<Mutex<Vec<SyncCycle>>>;

    fn recorder() -> (Seen, Subscriber) {
        let seen: Seen = Arc::default();
        let sink = Arc::clone(&seen);
        let subscriber: Subscriber = Arc::new(move |cycle: &SyncCycle| -> SubscriberResult {
            sink.lock().push(cycle.clone());
            Ok(())
        });
        (seen, subscriber)
    }

    fn engine(feed: &Arc<ScriptedFeed>) -> NotificationSyncEngine {
        NotificationSyncEngine::new(
            Arc::clone(feed) as Arc<dyn NotificationFeed>,
            PollingConfig {
                interval: Duration::from_secs(15),
                page_size: 20,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_before_start_returns() {
        let feed = Arc::new(ScriptedFeed::counts(&[3], &[1], &[2]));
        let engine = engine(&feed);
        let (seen, subscriber) = recorder();

        engine.start_polling(subscriber).await;

        assert_eq!(engine.state(), PollingState::Polling);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].has_changes);
        assert_eq!(
            engine.snapshot(),
            NotificationSnapshot {
                notifications: 3,
                announcements: 1,
                unread: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_only_adds_subscriber() {
        let feed = Arc::new(ScriptedFeed::counts(&[1], &[1], &[1]));
        let engine = engine(&feed);
        let (first, sub_a) = recorder();
        let (second, sub_b) = recorder();

        engine.start_polling(sub_a).await;
        engine.start_polling(sub_b).await;
        assert_eq!(feed.cycles(), 1);

        tokio::time::sleep(Duration::from_secs(46)).await;

        // one immediate cycle plus ticks at 15s, 30s and 45s from a single timer
        assert_eq!(feed.cycles(), 4);
        assert_eq!(first.lock().len(), 4);
        assert_eq!(second.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_announcement_growth_detected_only_when_it_happens() {
        let feed = Arc::new(ScriptedFeed::counts(&[4], &[2, 2, 2, 5], &[1]));
        let engine = engine(&feed);
        let (seen, subscriber) = recorder();

        engine.start_polling(subscriber).await;
        tokio::time::sleep(Duration::from_secs(46)).await;

        let seen = seen.lock();
        let flags: Vec<bool> = seen.iter().map(|c| c.has_changes).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(seen[2].announcements.len(), 2);
        assert_eq!(seen[3].announcements.len(), 5);
        assert_eq!(engine.snapshot().announcements, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_slice_keeps_last_good_value() {
        let feed = Arc::new(ScriptedFeed::default());
        feed.notifications.lock().extend([Ok(2), Ok(2)]);
        feed.announcements.lock().extend([Ok(3), Err(offline()), Ok(3)]);
        feed.unread.lock().extend([Ok(1), Ok(4)]);
        let engine = engine(&feed);
        let (seen, subscriber) = recorder();

        engine.start_polling(subscriber).await;
        let cycle = engine.sync_now().await;

        assert_eq!(cycle.announcements.len(), 3);
        assert!(cycle.is_stale(Slice::Announcements));
        assert_eq!(cycle.unread_count, 4);
        assert!(cycle.has_changes);
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(engine.snapshot().announcements, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_slices_failing_is_not_a_change() {
        let feed = Arc::new(ScriptedFeed::default());
        feed.notifications.lock().extend([Ok(1), Err(offline())]);
        feed.announcements.lock().extend([Ok(1), Err(offline())]);
        feed.unread
            .lock()
            .extend([Ok(1), Err(RequestFailure::new(ErrorKind::Timeout, "slow"))]);
        let engine = engine(&feed);
        let (_, subscriber) = recorder();

        engine.start_polling(subscriber).await;
        let cycle = engine.sync_now().await;

        assert!(!cycle.has_changes);
        assert_eq!(cycle.stale_slices.len(), 3);
        assert_eq!(cycle.snapshot(), engine.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_start_behaves_like_fresh_engine() {
        let feed = Arc::new(ScriptedFeed::counts(&[2], &[1], &[0]));
        let engine = engine(&feed);
        let (first, sub_a) = recorder();

        engine.start_polling(sub_a).await;
        engine.stop_polling();
        assert_eq!(engine.state(), PollingState::Idle);
        assert_eq!(engine.snapshot(), NotificationSnapshot::default());

        let (second, sub_b) = recorder();
        engine.start_polling(sub_b).await;
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(first.lock().len(), 1);
        let second = second.lock();
        assert!(second[0].has_changes);
        assert!(!second[1].has_changes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_idle_is_noop() {
        let feed = Arc::new(ScriptedFeed::counts(&[0], &[0], &[0]));
        let engine = engine(&feed);
        engine.stop_polling();
        engine.stop_polling();
        assert_eq!(engine.state(), PollingState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_engine_stops_ticking() {
        let feed = Arc::new(ScriptedFeed::counts(&[1], &[1], &[1]));
        let engine = engine(&feed);
        let (_, subscriber) = recorder();

        engine.start_polling(subscriber).await;
        engine.stop_polling();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(feed.cycles(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_subscribers_do_not_block_others() {
        let feed = Arc::new(ScriptedFeed::counts(&[1], &[1], &[1]));
        let engine = engine(&feed);
        let order = Arc::new(Mutex::new(Vec::new()));

        let erroring: Subscriber =
            Arc::new(|_: &SyncCycle| -> SubscriberResult { Err("render failed".into()) });
        #[allow(clippy::panic)]
        let panicking: Subscriber =
            Arc::new(|_: &SyncCycle| -> SubscriberResult { panic!("subscriber bug") });
        let log = Arc::clone(&order);
        let healthy: Subscriber = Arc::new(move |_: &SyncCycle| -> SubscriberResult {
            log.lock().push("healthy");
            Ok(())
        });

        engine.start_polling(erroring).await;
        engine.start_polling(panicking).await;
        engine.start_polling(healthy).await;
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(*order.lock(), vec!["healthy"]);
        assert_eq!(engine.state(), PollingState::Polling);
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(order.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_leaves_timer_running() {
        let feed = Arc::new(ScriptedFeed::counts(&[1], &[1], &[1]));
        let engine = engine(&feed);
        let (seen, subscriber) = recorder();

        let handle = engine.start_polling(subscriber).await;
        assert!(engine.unsubscribe(handle));
        assert!(!engine.unsubscribe(handle));
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(feed.cycles(), 2);
    }

    #[tokio::test]
    async fn test_sync_now_while_idle_records_nothing() {
        let feed = Arc::new(ScriptedFeed::counts(&[5], &[0], &[3]));
        let engine = engine(&feed);

        let cycle = engine.sync_now().await;

        assert!(cycle.has_changes);
        assert_eq!(cycle.notifications.len(), 5);
        assert_eq!(engine.snapshot(), NotificationSnapshot::default());
    }

    #[tokio::test]
    async fn test_push_operations_without_platform() {
        let feed = Arc::new(ScriptedFeed::counts(&[0], &[0], &[0]));
        let engine = engine(&feed);

        assert_eq!(engine.register_for_push_notifications().await.unwrap(), None);
        assert_eq!(engine.add_foreground_listener(Arc::new(|_: &ForegroundEvent| {})), None);
        engine.remove_listener(None);
    }

    fn envelope(data: serde_json::Value) -> RawResponse {
        RawResponse::json(200, &json!({"success": true, "data": data}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_mid_cycle_keeps_every_slice() {
        let transport = Arc::new(
            CannedTransport::routing(vec![
                ("/api/notifications", envelope(json!([{"_id": "n1"}, {"_id": "n2"}]))),
                ("/api/notifications/announcements", envelope(json!([{"_id": "a1"}]))),
                ("/api/notifications/unread-count", envelope(json!({"count": 2}))),
            ])
            .with_delay(Duration::from_secs(5)),
        );
        let credentials = Arc::new(InMemoryCredentials::with(CredentialScope::Standard, "tok"));
        let exec = Arc::new(executor(transport, credentials));
        let engine = NotificationSyncEngine::new(
            Arc::new(NotificationApi::new(Arc::clone(&exec))),
            PollingConfig {
                interval: Duration::from_secs(3600),
                page_size: 20,
            },
        );
        let (seen, subscriber) = recorder();

        engine.start_polling(subscriber).await;
        let before = engine.snapshot();
        assert_eq!(
            before,
            NotificationSnapshot {
                notifications: 2,
                announcements: 1,
                unread: 2,
            }
        );

        let (cycle, ()) = tokio::join!(engine.sync_now(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            exec.cancel_all();
        });

        assert_eq!(cycle.stale_slices.len(), 3);
        assert!(!cycle.has_changes);
        assert_eq!(cycle.snapshot(), before);
        assert_eq!(cycle.notifications[1].id, "n2");
        assert_eq!(engine.snapshot(), before);
        assert_eq!(seen.lock().len(), 2);

        engine.stop_polling();
    }
}
