//! Random start delay for scheduled runs.
//!
//! Every installation fires at the same cron minute; sleeping a random
//! 1..=N minutes first keeps a fleet of sellers from hitting the gateway
//! simultaneously.

use std::time::Duration;

use rand::Rng;
use tracing::info;

/// Pick the delay for this run. Zero max means no delay; otherwise a
/// uniform 1..=max minutes.
pub fn pick_delay(max_minutes: u32) -> Duration {
    if max_minutes == 0 {
        return Duration::ZERO;
    }
    let minutes = rand::thread_rng().gen_range(1..=u64::from(max_minutes));
    Duration::from_secs(minutes * 60)
}

/// Sleep out the jitter window before issuing.
pub async fn delay(max_minutes: u32) {
    let wait = pick_delay(max_minutes);
    if wait.is_zero() {
        return;
    }
    info!("waiting {} minute(s) before issuing", wait.as_secs() / 60);
    tokio::time::sleep(wait).await;
}
