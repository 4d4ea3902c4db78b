// Sweeper: runs the expiry sweep on a fixed interval for the life of the process

use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::engine::BookingEngine;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Starts the sweep loop on `runtime`. The first sweep happens one
    /// `interval` after spawning; intervals below 1ms are raised to 1ms.
    /// Dropping the returned `Sweeper` also ends the loop.
    pub fn spawn(engine: Arc<BookingEngine>, interval: Duration, runtime: &Handle) -> Self {
        if interval < MIN_INTERVAL {
            warn!(?interval, "sweep interval too small; using 1ms");
        }
        let interval = interval.max(MIN_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("sweep tick");
                        // Synchronous: a started sweep always runs to the end
                        engine.sweep_expired();
                    }
                    // Signalled, or the Sweeper was dropped
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("sweeper stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stops taking ticks and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "sweeper task ended abnormally");
        }
    }
}
