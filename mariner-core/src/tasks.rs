//! Time limits for keyed background tasks.
//!
//! [`TaskManager`] already replaces a running task when a new one is spawned
//! under the same key. This adds a deadline: a task that has not produced its
//! action in time sends a fallback action instead, so every spawn still
//! reports exactly once.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use tui_dispatch::{Action, TaskKey, TaskManager};

pub trait SpawnWithTimeout<A> {
    /// Like [`TaskManager::spawn`], but sends `on_timeout(limit)` if `future`
    /// has not finished within `limit`.
    fn spawn_with_timeout<F, T>(
        &mut self,
        key: impl Into<TaskKey>,
        limit: Duration,
        future: F,
        on_timeout: T,
    ) where
        F: Future<Output = A> + Send + 'static,
        T: FnOnce(Duration) -> A + Send + 'static;
}

impl<A: Action> SpawnWithTimeout<A> for TaskManager<A> {
    fn spawn_with_timeout<F, T>(
        &mut self,
        key: impl Into<TaskKey>,
        limit: Duration,
        future: F,
        on_timeout: T,
    ) where
        F: Future<Output = A> + Send + 'static,
        T: FnOnce(Duration) -> A + Send + 'static,
    {
        let key = key.into();
        let name = key.name().to_string();
        self.spawn(key, async move {
            match tokio::time::timeout(limit, future).await {
                Ok(action) => action,
                Err(_) => {
                    warn!(task = %name, limit_secs = limit.as_secs(), "Task timed out");
                    on_timeout(limit)
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[derive(tui_dispatch::Action, Clone, Debug, PartialEq)]
    enum Done {
        Value(u32),
        TimedOut(u64),
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_sends_fallback_action() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        tasks.spawn_with_timeout(
            "tides",
            Duration::from_secs(15),
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Done::Value(1)
            },
            |limit| Done::TimedOut(limit.as_secs()),
        );
        assert_eq!(rx.recv().await, Some(Done::TimedOut(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_task_beats_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        tasks.spawn_with_timeout(
            "weather",
            Duration::from_secs(30),
            async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Done::Value(7)
            },
            |limit| Done::TimedOut(limit.as_secs()),
        );
        assert_eq!(rx.recv().await, Some(Done::Value(7)));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_respawn_under_key_drops_pending_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        tasks.spawn_with_timeout(
            "zones",
            Duration::from_secs(5),
            std::future::pending::<Done>(),
            |limit| Done::TimedOut(limit.as_secs()),
        );
        tasks.spawn_with_timeout(
            "zones",
            Duration::from_secs(5),
            async { Done::Value(2) },
            |limit| Done::TimedOut(limit.as_secs()),
        );
        assert_eq!(rx.recv().await, Some(Done::Value(2)));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
