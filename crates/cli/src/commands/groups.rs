//! Groups command: list origin groups of the source collection

use crate::config::JobArgs;
use anyhow::{Context as _, Result};
use clap::Args;
use section_match_storage::{DirectoryProject, MatchStore};

#[derive(Args, Debug)]
pub struct GroupsCommand {
    #[command(flatten)]
    pub job: JobArgs,
}

impl GroupsCommand {
    pub fn execute(self) -> Result<()> {
        let settings = self.job.settings()?;
        let project = DirectoryProject::new(&settings.project_dir);
        let groups = project
            .origin_group_ids(&settings.source_collection)
            .with_context(|| format!("Failed to list groups of {}", settings.source_collection))?;
        for group in groups {
            println!("{group}");
        }
        Ok(())
    }
}
