use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::session::{IdentityStore, SessionEvent};

/// Background re-check of a pending broker's approval.
///
/// Runs only while the identity is an unapproved broker. The task ends when
/// the broker is approved, the role changes, the user logs out, or the
/// poller is dropped.
pub struct ApprovalPoller {
    handle: JoinHandle<()>,
}

impl ApprovalPoller {
    /// Start polling, or return `None` if the current identity needs no polling.
    pub fn start(
        store: IdentityStore,
        backend: Arc<dyn Backend>,
        every: Duration,
    ) -> Option<Self> {
        if !store.needs_approval_poll() {
            return None;
        }

        info!("Polling broker approval every {}s", every.as_secs());
        let mut events = store.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    event = events.recv() => {
                        match event {
                            Ok(SessionEvent::LoggedOut) | Err(RecvError::Closed) => break,
                            Ok(_) | Err(RecvError::Lagged(_)) => {
                                if !store.needs_approval_poll() {
                                    break;
                                }
                                continue;
                            }
                        }
                    }
                }

                if !store.needs_approval_poll() {
                    break;
                }
                match backend.broker_me().await {
                    Ok(status) => store.apply_broker_status(&status),
                    Err(err) => warn!("Broker status poll failed: {err}"),
                }
                if !store.needs_approval_poll() {
                    info!("Broker account approved");
                    break;
                }
            }
            debug!("Approval polling stopped");
        });

        Some(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ApprovalPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{user, FakeBackend};
    use crate::models::{BrokerStatus, Role};
    use std::sync::atomic::Ordering;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    async fn pending_broker(backend: &FakeBackend) -> IdentityStore {
        *backend.session.lock().unwrap() = Some(user(Role::Broker, false));
        backend
            .broker_statuses
            .lock()
            .unwrap()
            .push_back(Ok(BrokerStatus::default()));
        let store = IdentityStore::new();
        store.bootstrap(backend).await;
        store
    }

    #[tokio::test(start_paused = true)]
    async fn not_started_for_regular_users() {
        let backend = Arc::new(FakeBackend::default());
        *backend.session.lock().unwrap() = Some(user(Role::User, false));
        let store = IdentityStore::new();
        store.bootstrap(backend.as_ref()).await;

        assert!(ApprovalPoller::start(store, backend, FIVE_MINUTES).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_approved() {
        let backend = Arc::new(FakeBackend::default());
        let store = pending_broker(&backend).await;
        let calls_after_bootstrap = backend.broker_me_calls.load(Ordering::SeqCst);

        {
            let mut statuses = backend.broker_statuses.lock().unwrap();
            statuses.push_back(Ok(BrokerStatus::default()));
            statuses.push_back(Ok(BrokerStatus {
                is_approved: true,
                ..BrokerStatus::default()
            }));
        }

        let poller = ApprovalPoller::start(store.clone(), backend.clone(), FIVE_MINUTES).unwrap();

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), calls_after_bootstrap);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), calls_after_bootstrap + 1);
        assert!(store.needs_approval_poll());

        tokio::time::sleep(FIVE_MINUTES).await;
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), calls_after_bootstrap + 2);
        assert!(store.current_user().unwrap().is_approved);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(poller.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_stops_polling() {
        let backend = Arc::new(FakeBackend::default());
        let store = pending_broker(&backend).await;
        let poller = ApprovalPoller::start(store.clone(), backend.clone(), FIVE_MINUTES).unwrap();

        store.logout(backend.as_ref()).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(poller.is_finished());

        let calls = backend.broker_me_calls.load(Ordering::SeqCst);
        tokio::time::sleep(FIVE_MINUTES * 2).await;
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_cancels_it() {
        let backend = Arc::new(FakeBackend::default());
        let store = pending_broker(&backend).await;
        let calls = backend.broker_me_calls.load(Ordering::SeqCst);

        drop(ApprovalPoller::start(store, backend.clone(), FIVE_MINUTES));
        tokio::time::sleep(FIVE_MINUTES * 3).await;
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), calls);
    }
}
