//! Periodic release checks.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Delay before the first check after startup.
pub const INITIAL_DELAY: Duration = Duration::from_secs(3);
pub const CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Runs `check` after `initial`, then every `interval`, until cancelled.
pub fn spawn_periodic<F, Fut>(
    initial: Duration,
    interval: Duration,
    cancel: CancellationToken,
    mut check: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(initial) => {}
        }

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => check().await,
            }
        }
    })
}
