//! Proactive session refresh on a fixed interval.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::Session;
use crate::error::{CoreError, Result};

/// Default refresh period: 50 minutes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

/// Background task renewing a session every `period`.
///
/// The first refresh happens one full period after spawning. The task stops
/// when [`SessionRefresher::stop`] is called, when the refresher is dropped,
/// or when renewal reports an auth error (signed out or expired). Other
/// errors are logged and the next tick tries again.
pub struct SessionRefresher {
    handle: JoinHandle<()>,
    latest: watch::Receiver<Option<Session>>,
}

impl SessionRefresher {
    /// Spawn on the current tokio runtime.
    pub fn spawn<F>(period: Duration, mut renew: F) -> Self
    where
        F: FnMut() -> Result<Session> + Send + 'static,
    {
        let (tx, latest) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match renew() {
                    Ok(session) => {
                        tracing::debug!(user = %session.user_id, expires_at = %session.expires_at, "session refreshed");
                        if tx.send(Some(session)).is_err() {
                            break;
                        }
                    }
                    Err(CoreError::Auth(e)) => {
                        tracing::info!(error = %e, "session ended; stopping refresh");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "session refresh failed");
                    }
                }
            }
        });
        Self { handle, latest }
    }

    /// Receiver yielding each refreshed session.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.latest.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the timer.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SessionRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn session() -> Session {
        Session {
            user_id: "u".to_string(),
            email: "u@example.com".to_string(),
            token: "t".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_once_per_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let refresher = SessionRefresher::spawn(DEFAULT_REFRESH_INTERVAL, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(session())
        });
        let mut rx = refresher.subscribe();

        tokio::time::sleep(Duration::from_secs(49 * 60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(52 * 60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(rx.borrow_and_update().is_some());

        refresher.stop();
        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_session_ends() {
        let refresher = SessionRefresher::spawn(Duration::from_secs(60), || {
            Err(AuthError::SessionExpired.into())
        });
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(!refresher.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_going_after_storage_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let refresher = SessionRefresher::spawn(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::Custom("database is busy".to_string()))
        });
        tokio::time::sleep(Duration::from_secs(181)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(refresher.is_running());
    }
}
