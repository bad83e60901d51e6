//! Batch Scheduler Module
//!
//! A fixed-period trigger: every tick publishes an empty
//! `create-next-batch.request`. It keeps no state and does not wait for the
//! previous build to finish.

use crate::bus::{Event, EventBus};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{info, warn};

/// Periodic build trigger
pub struct BatchScheduler {
    bus: Arc<dyn EventBus>,
    period: Duration,
}

impl BatchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    /// * `bus` - Bus the build requests are published on
    /// * `period` - Time between ticks; must be non-zero
    pub fn new(bus: Arc<dyn EventBus>, period: Duration) -> Self {
        Self { bus, period }
    }

    /// Run the scheduler on its own task for the rest of the process.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Tick forever. The first tick fires one period after start.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "batch scheduler started");
        let mut ticker = interval_at(Instant::now() + self.period, self.period);

        loop {
            ticker.tick().await;
            if let Err(e) = self.bus.publish_event(&Event::CreateNextBatchRequest).await {
                warn!(error = %e, "failed to publish create next batch request");
            }
        }
    }
}
