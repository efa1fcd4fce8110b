//! The fetch planner and executor: computes missing sub-intervals per tag,
//! fans them out to upstream with bounded parallelism, merges results into
//! RAW under the lock, and persists when anything changed.

use std::sync::Arc;

use explorer_core::{ChangeSignature, Interval, MiniTable};
use futures::stream::{self, StreamExt};

use crate::state::AppState;

const MAX_PARALLEL_FETCHES: usize = 4;

pub struct FetchOutcome {
    pub new_data: bool,
}

/// Implements `spec.md` §4.3 `fetchInto(tags, S, E)` verbatim:
///
/// 1. drop coverage/columns for tags no longer requested;
/// 2. compute gaps per requested tag;
/// 3. fetch every gap concurrently, bounded to `min(tags.len(), 4)`;
/// 4. merge each non-empty result into RAW and record its gap as covered;
/// 5. persist iff the change signature moved.
pub async fn fetch_into(
    state: &Arc<AppState>,
    tags: &[String],
    start_sec: i64,
    end_sec: i64,
) -> FetchOutcome {
    let (gaps_by_tag, signature_before) = {
        let mut shared = state.inner.lock().await;
        let signature_before = ChangeSignature::of(&shared.raw);

        let requested: std::collections::HashSet<&str> =
            tags.iter().map(String::as_str).collect();
        let currently_tracked: Vec<String> =
            shared.raw.tag_names().map(str::to_string).collect();
        for tag in currently_tracked {
            if !requested.contains(tag.as_str()) {
                shared.raw.drop_column(&tag);
                shared.coverage.drop(&tag);
            }
        }

        let gaps_by_tag: Vec<(String, Vec<Interval>)> = tags
            .iter()
            .map(|tag| (tag.clone(), shared.coverage.gaps(tag, start_sec, end_sec)))
            .collect();

        (gaps_by_tag, signature_before)
    };

    let fetch_jobs: Vec<(String, Interval)> = gaps_by_tag
        .into_iter()
        .flat_map(|(tag, gaps)| gaps.into_iter().map(move |g| (tag.clone(), g)))
        .collect();

    let parallelism = MAX_PARALLEL_FETCHES.min(tags.len().max(1));
    let results: Vec<(String, Interval, Vec<explorer_core::Sample>)> = stream::iter(fetch_jobs)
        .map(|(tag, gap)| {
            let upstream = Arc::clone(&state.upstream);
            async move {
                let samples = upstream.fetch_samples(&tag, gap.start_sec, gap.end_sec).await;
                (tag, gap, samples)
            }
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;

    {
        let mut shared = state.inner.lock().await;
        for (tag, gap, samples) in results {
            if samples.is_empty() {
                tracing::warn!(%tag, start = gap.start_sec, end = gap.end_sec, "upstream fetch returned no data, gap left uncovered");
                continue;
            }
            shared.raw.ingest(MiniTable {
                tag: tag.clone(),
                samples,
            });
            shared.coverage.record(&tag, gap);
        }

        let signature_after = ChangeSignature::of(&shared.raw);
        let new_data = signature_after != signature_before;
        if new_data {
            if let Err(err) = shared.persist_raw_and_coverage(&state.cache_dir()) {
                tracing::error!(%err, "failed to persist RAW table and coverage ledger");
            }
        }
        FetchOutcome { new_data }
    }
}
