//! Celebratory side effect — cosmetic, fire-and-forget, time-bounded.
//!
//! The core schedules bursts; rendering them (particles, a terminal bell,
//! nothing at all) belongs to the presentation collaborator. A burst failure
//! is logged and swallowed: it can never become a transition error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::task::JoinHandle;

/// Interval between burst pairs.
const BURST_INTERVAL: Duration = Duration::from_millis(250);

/// Sink for celebration bursts, implemented by the presentation layer.
#[async_trait]
pub trait CelebrationEffect: Send + Sync {
    /// Emit one burst. `intensity` decays linearly from 1.0 to 0.0 over the
    /// effect's lifetime; `origin` is a horizontal position in `[0, 1]`.
    async fn burst(&self, intensity: f64, origin: f64) -> anyhow::Result<()>;
}

/// Effect sink that only logs. Used by the binary when no renderer is
/// attached.
pub struct LogCelebration;

#[async_trait]
impl CelebrationEffect for LogCelebration {
    async fn burst(&self, intensity: f64, origin: f64) -> anyhow::Result<()> {
        tracing::info!(intensity, origin, "Celebration burst");
        Ok(())
    }
}

/// Spawn the time-bounded celebration task.
///
/// Emits a pair of bursts (one from each side of the screen) every 250 ms
/// with decaying intensity, then self-terminates once `duration` has
/// elapsed. Callers keep the handle and abort it on teardown so no timer
/// outlives the session.
pub fn spawn_celebration(
    effect: Arc<dyn CelebrationEffect>,
    duration: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        let mut interval = tokio::time::interval(BURST_INTERVAL);
        loop {
            interval.tick().await;
            let elapsed = started.elapsed();
            if elapsed >= duration {
                break;
            }
            let intensity = 1.0 - elapsed.as_secs_f64() / duration.as_secs_f64();
            let (left, right) = {
                let mut rng = rand::thread_rng();
                (rng.gen_range(0.1..0.3), rng.gen_range(0.7..0.9))
            };
            for origin in [left, right] {
                if let Err(e) = effect.burst(intensity, origin).await {
                    tracing::warn!(error = %e, "Celebration burst failed");
                }
            }
        }
        tracing::debug!("Celebration finished");
    })
}
