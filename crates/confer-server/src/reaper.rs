//! Idle reaper (I): periodically evicts clients whose last activity is too
//! old (§4.7).

use std::time::Duration;

use confer_core::Environment;

use crate::SharedState;

/// How often the reaper scans the client registry.
pub const REAP_INTERVAL: Duration = Duration::from_secs(5);
/// How long a client may go without sending a frame before eviction.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(60);

/// Run the reaper loop forever, sleeping `REAP_INTERVAL` between scans.
pub async fn run<E: Environment>(state: SharedState<E>, env: E)
where
    E::Instant: std::ops::Sub<Output = Duration>,
{
    loop {
        env.sleep(REAP_INTERVAL).await;

        let now = env.now();
        let evicted = {
            let mut guard = state.lock().await;
            guard.reap_idle(now, IDLE_THRESHOLD)
        };

        for record in evicted {
            tracing::info!(client = %record.id, addr = %record.addr, "evicted idle client");
            record.handle.close.notify_one();
        }
    }
}
