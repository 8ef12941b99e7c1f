//! Job configuration
//!
//! A job is described by a JSON file using the render job keys
//! (`stack`, `polygon_dir`, `matchcollection`, `targetmatchcollection`) plus
//! `project_dir`, `workers` and `continue_on_error`. Unknown keys (such as a
//! `render` connection block) are ignored. Command line flags take precedence
//! over the file.

use anyhow::{bail, Context, Result};
use clap::Args;
use section_match_filter::{FailurePolicy, FilterTarget, RunOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct JobConfig {
    pub stack: Option<String>,
    pub polygon_dir: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
    #[serde(rename = "matchcollection")]
    pub match_collection: Option<String>,
    #[serde(rename = "targetmatchcollection")]
    pub target_match_collection: Option<String>,
    pub workers: Option<usize>,
    pub continue_on_error: Option<bool>,
}

pub fn load_config(path: &Path) -> Result<JobConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file: {}", path.display()))?;
    let config: JobConfig =
        serde_json::from_str(&contents).context("Failed to parse job file as JSON")?;
    Ok(config)
}

/// Job options shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// JSON job file
    #[arg(long = "input-json", value_name = "FILE")]
    pub input_json: Option<PathBuf>,

    /// Stack whose sections and tiles the matches refer to
    #[arg(long)]
    pub stack: Option<String>,

    /// Directory holding polygon_{z:05}.json region files
    #[arg(long)]
    pub polygon_dir: Option<PathBuf>,

    /// Project directory holding stacks/ and matches/
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Match collection to read candidate correspondences from
    #[arg(long)]
    pub match_collection: Option<String>,

    /// Match collection to write surviving correspondences to
    #[arg(long)]
    pub target_match_collection: Option<String>,

    /// Number of groups processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Keep processing other groups after a group fails
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Fully resolved job settings
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    pub stack: String,
    pub polygon_dir: PathBuf,
    pub project_dir: PathBuf,
    pub source_collection: String,
    pub target_collection: String,
    pub workers: usize,
    pub policy: FailurePolicy,
}

fn required<T: Clone>(cli: &Option<T>, file: &Option<T>, name: &str) -> Result<T> {
    match cli.as_ref().or(file.as_ref()) {
        Some(value) => Ok(value.clone()),
        None => bail!("Missing required setting: {name}"),
    }
}

impl FilterSettings {
    /// Resolve with precedence CLI > job file > defaults
    pub fn resolve(args: &JobArgs, file: &JobConfig) -> Result<Self> {
        let stack = required(&args.stack, &file.stack, "stack")?;
        let polygon_dir = required(&args.polygon_dir, &file.polygon_dir, "polygon_dir")?;
        let project_dir = required(&args.project_dir, &file.project_dir, "project_dir")?;
        let source_collection =
            required(&args.match_collection, &file.match_collection, "matchcollection")?;
        let target_collection = required(
            &args.target_match_collection,
            &file.target_match_collection,
            "targetmatchcollection",
        )?;

        let continue_on_error = args.continue_on_error || file.continue_on_error.unwrap_or(false);
        let policy = if continue_on_error {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::FailFast
        };
        // Sequential by default for fail-fast behavior, parallel when continuing on error
        let workers = match args.workers.or(file.workers) {
            Some(n) => n,
            None if continue_on_error => rayon::current_num_threads(),
            None => 1,
        };

        let settings = Self {
            stack,
            polygon_dir,
            project_dir,
            source_collection,
            target_collection,
            workers,
            policy,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.stack.trim().is_empty() {
            bail!("stack must not be empty");
        }
        if self.source_collection.trim().is_empty() || self.target_collection.trim().is_empty() {
            bail!("match collection names must not be empty");
        }
        if self.source_collection == self.target_collection {
            bail!(
                "source and target match collections are both {:?}; filtering in place is not supported",
                self.source_collection
            );
        }
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn target(&self) -> FilterTarget {
        FilterTarget {
            stack: self.stack.clone(),
            source_collection: self.source_collection.clone(),
            target_collection: self.target_collection.clone(),
        }
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            workers: self.workers,
            policy: self.policy,
        }
    }
}

impl JobArgs {
    /// Load the job file (if any) and resolve against the flags
    pub fn settings(&self) -> Result<FilterSettings> {
        let file = match &self.input_json {
            Some(path) => load_config(path)?,
            None => JobConfig::default(),
        };
        FilterSettings::resolve(self, &file)
    }
}
