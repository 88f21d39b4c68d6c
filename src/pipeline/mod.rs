//! Episode batch pipeline.

pub mod job;
pub mod orchestrator;

pub use job::{EpisodeJob, JobError, JobOutcome, JobState};
pub use orchestrator::{Orchestrator, RunSummary};
pub use seasonmux_av::TemplateContext;

use crate::config::NamingConfig;
use crate::scanner::{EpisodeNumber, FileClassifier, FontAttachment, MediaFile};
use crate::state::StatusAggregator;
use seasonmux_av::{ToolCommand, ToolInvoker, ToolOutput};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Program paths and limits for the two external stages.
#[derive(Debug, Clone)]
pub struct ResolvedTools {
    pub mkvmerge: PathBuf,
    pub mkvpropedit: PathBuf,
    pub timeout: Option<Duration>,
}

/// Everything a job reads, shared read-only by all jobs of a run.
pub struct JobContext {
    /// Every classified input file; jobs group from this list.
    pub files: Vec<MediaFile>,
    pub fonts: Vec<FontAttachment>,
    pub classifier: FileClassifier,
    pub naming: NamingConfig,
    pub output_dir: PathBuf,
    pub tools: ResolvedTools,
    pub invoker: Arc<dyn ToolInvoker>,
    pub status: Arc<StatusAggregator>,
}

impl JobContext {
    /// `<output_dir>/<template>` with `{base}`, `{season}` and `{episode}`
    /// filled in.
    pub fn output_path(&self, episode: &EpisodeNumber) -> PathBuf {
        let name = TemplateContext::new()
            .with_episode(&self.naming.base_name, &self.naming.season, episode.as_str())
            .substitute(&self.naming.template);
        self.output_dir.join(name)
    }
}

/// Prints each command instead of running it, and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunInvoker;

impl ToolInvoker for DryRunInvoker {
    fn invoke(&self, command: &ToolCommand) -> seasonmux_av::Result<ToolOutput> {
        println!("[DRY RUN] {}", command.display());
        Ok(ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }
}
