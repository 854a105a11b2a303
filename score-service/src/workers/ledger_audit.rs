use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::services::score_service::ScoreService;

/// Periodically replays recently-updated ledgers and flags snapshots that
/// drifted from their history. Drift is repaired through the admin
/// recalculation endpoint, not here.
pub async fn start(service: Arc<ScoreService>, interval_secs: u64, batch_size: i64) -> Result<()> {
    info!("Ledger audit worker started");

    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;

        match service.audit(batch_size).await {
            Ok(report) if report.mismatched.is_empty() => {
                debug!(checked = report.checked, "ledger audit clean");
            }
            Ok(report) => {
                warn!(
                    checked = report.checked,
                    mismatched = report.mismatched.len(),
                    "ledger audit found drifted snapshots"
                );
            }
            Err(err) => {
                warn!(error = %err, "ledger audit pass failed");
            }
        }
    }
}
