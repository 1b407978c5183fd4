use std::time::Duration;

use chrono::Utc;
use log::*;
use promotion_engine::{PromotionFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the promotion expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_expiry_worker(db: SqliteDatabase, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = PromotionFlowApi::new(db);
        info!("🕰️ Promotion expiry worker started. Sweeping every {} s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running promotion expiry sweep");
            match api.sweep_expired(Utc::now()).await {
                Ok(0) => trace!("🕰️ No promotions expired"),
                Ok(count) => info!("🕰️ {count} promotions expired"),
                Err(e) => error!("🕰️ Error running promotion expiry sweep: {e}"),
            }
        }
    })
}
