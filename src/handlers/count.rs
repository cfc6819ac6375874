use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use crate::metrics::{COUNT_CACHE_HITS, COUNT_CACHE_MISSES};
use crate::models::CountResponse;
use crate::state::AppState;

// Never fails: an unconfigured or unreachable store reads as zero
pub async fn count_handler(State(state): State<Arc<AppState>>) -> Json<CountResponse> {
    Json(CountResponse {
        count: waitlist_count(&state).await,
    })
}

async fn waitlist_count(state: &AppState) -> u64 {
    let Some(store) = state.store.as_ref() else {
        return 0;
    };

    if let Some(count) = state.count_cache.get().await {
        COUNT_CACHE_HITS.inc();
        return count;
    }
    COUNT_CACHE_MISSES.inc();

    match store.count().await {
        Ok(count) => {
            state.count_cache.put(count).await;
            count
        }
        Err(e) => {
            warn!(error = %e, "waitlist count failed, reporting 0");
            0
        }
    }
}
