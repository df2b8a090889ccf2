use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};
use tracing_futures::Instrument;

/// Default refresh period for the watchlist and market feeds.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);

/// Runs a job on a fixed period until cancelled.
///
/// The first run happens one full period after spawning. Cancelling never
/// interrupts a run already in progress; it only prevents the next one.
/// Dropping the handle cancels the task.
pub struct PeriodicTask {
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);

        let handle = tokio::spawn(
            async move {
                info!(period_ms = period.as_millis() as u64, "periodic task started");

                let mut tick = interval_at(Instant::now() + period, period);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        _ = signal.notified() => break,
                        _ = tick.tick() => {
                            debug!("tick");
                            job().await;
                        }
                    }
                }

                info!("periodic task stopped");
            }
            .instrument(tracing::info_span!("periodic", task = name)),
        );

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        // notify_one keeps a permit, so a cancel issued mid-run is seen on the next turn.
        self.shutdown.notify_one();
    }

    /// Cancel and wait for the loop to exit, including any run in progress.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
