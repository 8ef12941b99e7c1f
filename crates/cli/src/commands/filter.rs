//! Filter command: crop every origin group's matches to the section regions

use crate::config::{FilterSettings, JobArgs};
use anyhow::{bail, Context as _, Result};
use clap::Args;
use section_match_filter::{run_groups, MatchFilter, RunSummary};
use section_match_storage::{DirectoryProject, DirectoryRegionStore};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Args, Debug)]
pub struct FilterCommand {
    #[command(flatten)]
    pub job: JobArgs,

    /// Only filter these origin groups (default: every group in the collection)
    #[arg(long = "group", value_name = "GROUP_ID")]
    pub groups: Vec<String>,
}

/// Build the engine over a project directory and filter the requested groups
pub fn run_filter(settings: &FilterSettings, groups: &[String]) -> Result<RunSummary> {
    let project = Arc::new(DirectoryProject::new(&settings.project_dir));
    let regions = DirectoryRegionStore::new(&settings.polygon_dir);

    let filter = MatchFilter::prepare(settings.target(), project.clone(), project, &regions)
        .with_context(|| format!("Failed to load regions for stack {}", settings.stack))?;

    let groups = if groups.is_empty() {
        filter
            .origin_groups()
            .context("Failed to list origin groups")?
    } else {
        groups.to_vec()
    };

    Ok(run_groups(&filter, &groups, &settings.run_options())?)
}

impl FilterCommand {
    pub fn execute(self) -> Result<()> {
        let settings = self.job.settings()?;
        info!("=== Section Match Filter ===");
        info!("Project: {}", settings.project_dir.display());
        info!("Polygons: {}", settings.polygon_dir.display());

        let summary = run_filter(&settings, &self.groups)?;
        for (group_id, err) in summary.failures() {
            error!("Group {} failed: {}", group_id, err);
        }

        if !summary.is_success() {
            bail!(
                "{} groups failed, {} not processed",
                summary.failed_count(),
                summary.skipped.len()
            );
        }
        info!(
            "Republished {} correspondences from {} groups to {}",
            summary.kept_total(),
            summary.outcomes.len(),
            settings.target_collection
        );
        Ok(())
    }
}
