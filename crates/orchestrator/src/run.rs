//! Parallel run over many origin groups
//!
//! Groups are independent units of work. Each worker of a dedicated rayon
//! pool runs full `filter_group` passes; errors are captured per group. With
//! [`FailurePolicy::FailFast`] no new group is started once one has failed.

use crate::error::{FilterError, Result};
use crate::group::{GroupReport, MatchFilter};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};

/// What to do with the remaining groups once one group fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop dispatching new groups; groups already running finish
    #[default]
    FailFast,
    /// Run every group regardless of failures
    ContinueOnError,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Worker threads (at least 1)
    pub workers: usize,
    pub policy: FailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            policy: FailurePolicy::FailFast,
        }
    }
}

/// Result of one group
#[derive(Debug)]
pub struct GroupOutcome {
    pub group_id: String,
    pub result: Result<GroupReport>,
}

/// Results of a run, in the order the groups were given
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<GroupOutcome>,
    /// Groups never started because an earlier group failed
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn reports(&self) -> impl Iterator<Item = &GroupReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FilterError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.group_id.as_str(), e)))
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0 && self.skipped.is_empty()
    }

    /// Total correspondences republished across all groups
    #[must_use]
    pub fn kept_total(&self) -> usize {
        self.reports().map(|r| r.kept).sum()
    }
}

/// Filter `groups` on a pool of `options.workers` threads
pub fn run_groups(
    filter: &MatchFilter,
    groups: &[String],
    options: &RunOptions,
) -> Result<RunSummary> {
    let workers = options.workers.max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("match-filter-{i}"))
        .build()
        .map_err(|e| FilterError::WorkerPool(e.to_string()))?;

    info!("=== Match Filter Run Started ===");
    info!("Stack: {}", filter.target().stack);
    info!(
        "Collections: {} -> {}",
        filter.target().source_collection,
        filter.target().target_collection
    );
    info!("Groups: {}, workers: {}, policy: {:?}", groups.len(), workers, options.policy);

    let start = Instant::now();
    let should_stop = AtomicBool::new(false);
    let fail_fast = options.policy == FailurePolicy::FailFast;

    let results: Vec<Option<Result<GroupReport>>> = pool.install(|| {
        groups
            .par_iter()
            .map(|group_id| {
                if fail_fast && should_stop.load(Ordering::SeqCst) {
                    return None;
                }
                let result = filter.filter_group(group_id);
                if let Err(e) = &result {
                    error!("[GROUP {}] failed: {}", group_id, e);
                    if fail_fast {
                        should_stop.store(true, Ordering::SeqCst);
                    }
                }
                Some(result)
            })
            .collect()
    });

    let mut summary = RunSummary::default();
    for (group_id, result) in groups.iter().zip(results) {
        match result {
            Some(result) => summary.outcomes.push(GroupOutcome {
                group_id: group_id.clone(),
                result,
            }),
            None => summary.skipped.push(group_id.clone()),
        }
    }

    if !summary.skipped.is_empty() {
        warn!(
            "Stopped after failure: {} groups not processed",
            summary.skipped.len()
        );
    }
    info!("=== Match Filter Run Completed ===");
    info!(
        "Groups: {} ok, {} failed, {} skipped; {} correspondences republished in {:.2}s",
        summary.reports().count(),
        summary.failed_count(),
        summary.skipped.len(),
        summary.kept_total(),
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Filter every origin group of the source collection
pub fn run_all(filter: &MatchFilter, options: &RunOptions) -> Result<RunSummary> {
    let groups = filter.origin_groups()?;
    run_groups(filter, &groups, options)
}
