use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::WordCache;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);
const EVICTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Periodically drops expired word-cache entries until `cancel_token` fires.
pub async fn eviction_loop(cache: WordCache, interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match tokio::time::timeout(EVICTION_TIMEOUT, cache.evict_expired()).await {
                    Ok(0) => {},
                    Ok(removed) => log_info!("eviction pass dropped {removed} stale entries"),
                    Err(_) => log_warn!("eviction pass timed out (> {}s)", EVICTION_TIMEOUT.as_secs()),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("eviction loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lookup::cache_ttl,
        models::{word::tests::sample_record, WordKey},
        storage::Storage,
    };
    use chrono::Utc;

    #[tokio::test]
    async fn first_tick_evicts_and_cancel_stops_loop() {
        let cache = WordCache::new(Storage::in_memory());
        let key = WordKey::parse("cat").unwrap();
        let expired_at = Utc::now() - cache_ttl() - chrono::Duration::seconds(1);
        cache.set_cached_at(&key, sample_record("cat"), expired_at).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(eviction_loop(
            cache.clone(),
            Duration::from_secs(3600),
            token.clone(),
        ));

        // The interval's first tick fires immediately.
        while !cache.is_empty().await {
            tokio::task::yield_now().await;
        }
        token.cancel();
        handle.await.unwrap();
    }
}
