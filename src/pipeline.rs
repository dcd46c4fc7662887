//! The announce-and-mark loop: filter out already-announced candidates, then
//! compose, submit, and mark each survivor in input order.
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::bluesky::{build_post_record, Publisher};
use crate::candidates::Candidate;
use crate::compose::compose;
use crate::marker::MarkerStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print composed records to stdout instead of submitting them.
    pub dry_run: bool,
    /// With `dry_run`, still exercise the marker write path.
    pub simulate_push: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates dropped because their page already carries a marker.
    pub skipped: usize,
    /// Candidates submitted (or simulated) and marked.
    pub announced: usize,
    /// Candidates printed by a dry run without a marker write.
    pub previewed: usize,
}

/// Drop candidates whose page is already marked; survivors keep input order.
pub fn filter_candidates(candidates: Vec<Candidate>, store: &dyn MarkerStore) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| !store.is_marked(candidate))
        .collect()
}

/// Announce every unmarked candidate, strictly sequentially. The first
/// failure aborts the run: earlier candidates stay marked, the rest are
/// untouched and will be picked up by the next run.
pub async fn run(
    candidates: Vec<Candidate>,
    store: &dyn MarkerStore,
    publisher: &dyn Publisher,
    opts: RunOptions,
) -> Result<RunSummary> {
    let total = candidates.len();
    let pending = filter_candidates(candidates, store);
    let mut summary = RunSummary {
        skipped: total - pending.len(),
        ..RunSummary::default()
    };
    info!(total, pending = pending.len(), "filtered candidates");

    for candidate in pending {
        let announcement = compose(&candidate);

        if opts.dry_run {
            let record = build_post_record(&announcement, &Utc::now().to_rfc3339());
            println!("{}", serde_json::to_string(&record)?);
            if !opts.simulate_push {
                summary.previewed += 1;
                continue;
            }
        }

        let uri = publisher
            .publish(&announcement)
            .await
            .with_context(|| format!("failed to announce {}", candidate.path))?;
        store
            .set_marked(&candidate, &uri)
            .with_context(|| format!("failed to mark {}", candidate.path))?;
        info!(path=%candidate.path, %uri, "announced");
        summary.announced += 1;
    }

    Ok(summary)
}
