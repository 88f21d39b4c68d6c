//! Per-episode job: group files, merge them, then attach fonts.
//!
//! ```text
//! Pending -> Merging -> MergeFailed
//!                    -> MergeSucceeded -> Done              (no fonts)
//!                                      -> AttachingFonts -> Done
//!                                                        -> FontFailed
//! ```
//!
//! Terminal states are `MergeFailed`, `FontFailed` and `Done`. A job never
//! retries and never leaves a terminal state.

use super::JobContext;
use crate::scanner::{EpisodeNumber, MediaFile};
use crate::state::{ErrorRecord, Stage};
use seasonmux_av::{attach_fonts_command, merge_command, ToolCommand, ToolOutput};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of an [`EpisodeJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Merging,
    MergeFailed,
    MergeSucceeded,
    AttachingFonts,
    FontFailed,
    Done,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::MergeFailed | JobState::FontFailed | JobState::Done
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobState::MergeFailed | JobState::FontFailed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Merging)
                | (Merging, MergeFailed)
                | (Merging, MergeSucceeded)
                | (MergeSucceeded, AttachingFonts)
                | (MergeSucceeded, Done)
                | (AttachingFonts, FontFailed)
                | (AttachingFonts, Done)
        )
    }
}

/// Why a job ended in a failed state.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobError {
    /// The multiplexer exited non-zero.
    #[error("merge failed for episode {episode} (exit code {exit_code:?})")]
    Merge {
        episode: EpisodeNumber,
        files: Vec<String>,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The property editor exited non-zero.
    #[error("font attach failed for episode {episode} (exit code {exit_code:?})")]
    FontAttach {
        episode: EpisodeNumber,
        target: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The tool exceeded its deadline and was killed.
    #[error("{stage} timed out for episode {episode} after {timeout:?}")]
    Timeout {
        stage: Stage,
        episode: EpisodeNumber,
        timeout: Duration,
    },

    /// The tool could not be started.
    #[error("{stage} could not start for episode {episode}: {message}")]
    Spawn {
        stage: Stage,
        episode: EpisodeNumber,
        message: String,
    },
}

impl JobError {
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Merge { .. } => Stage::Merge,
            JobError::FontAttach { .. } => Stage::Fonts,
            JobError::Timeout { stage, .. } | JobError::Spawn { stage, .. } => *stage,
        }
    }

    pub fn episode(&self) -> &EpisodeNumber {
        match self {
            JobError::Merge { episode, .. }
            | JobError::FontAttach { episode, .. }
            | JobError::Timeout { episode, .. }
            | JobError::Spawn { episode, .. } => episode,
        }
    }

    /// Error log entry: stage label, episode, then the captured streams or
    /// the failure reason.
    pub fn to_record(&self) -> ErrorRecord {
        let stage = self.stage();
        let detail = match self {
            JobError::Merge { stdout, stderr, .. }
            | JobError::FontAttach { stdout, stderr, .. } => format!("{}\n{}", stdout, stderr),
            JobError::Timeout { .. } | JobError::Spawn { .. } => self.to_string(),
        };

        ErrorRecord {
            episode: self.episode().clone(),
            stage,
            text: format!("{}\n{}\n{}\n", stage.error(), self.episode(), detail),
        }
    }
}

/// Final result of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub episode: EpisodeNumber,
    pub state: JobState,
    pub output: PathBuf,
    pub files: Vec<MediaFile>,
    pub error: Option<JobError>,
}

/// One episode's trip through the merge and font-attach stages.
pub struct EpisodeJob<'a> {
    ctx: &'a JobContext,
    episode: EpisodeNumber,
    state: JobState,
    files: Vec<MediaFile>,
    output: PathBuf,
}

impl<'a> EpisodeJob<'a> {
    pub fn new(ctx: &'a JobContext, episode: EpisodeNumber) -> Self {
        let output = ctx.output_path(&episode);
        Self {
            ctx,
            episode,
            state: JobState::Pending,
            files: Vec::new(),
            output,
        }
    }

    /// Run to a terminal state. Failures are recorded in the status
    /// aggregator and returned in the outcome; nothing escapes the job.
    pub fn run(mut self) -> JobOutcome {
        self.files = self.ctx.classifier.group(&self.ctx.files, &self.episode);
        if self.files.is_empty() {
            warn!("Episode {} has no groupable files", self.episode);
        }

        self.transition(JobState::Merging);
        self.report(&Stage::Merge.started());

        if let Err(e) = self.merge() {
            return self.fail(JobState::MergeFailed, e);
        }
        self.transition(JobState::MergeSucceeded);
        self.report(&Stage::Merge.done());
        info!("Episode {} merged into {:?}", self.episode, self.output);

        if self.ctx.fonts.is_empty() {
            self.transition(JobState::Done);
            return self.finish(None);
        }

        self.transition(JobState::AttachingFonts);
        self.report(&Stage::Fonts.started());

        if let Err(e) = self.attach_fonts() {
            return self.fail(JobState::FontFailed, e);
        }
        self.transition(JobState::Done);
        self.report(&Stage::Fonts.done());
        info!(
            "Episode {}: attached {} font(s)",
            self.episode,
            self.ctx.fonts.len()
        );

        self.finish(None)
    }

    fn merge(&self) -> Result<(), JobError> {
        let inputs: Vec<_> = self.files.iter().map(MediaFile::merge_input).collect();
        let cmd = merge_command(
            self.ctx.tools.mkvmerge.clone(),
            &self.output_str(),
            &inputs,
        );

        let output = self.invoke(Stage::Merge, cmd)?;
        if output.success() {
            return Ok(());
        }

        Err(JobError::Merge {
            episode: self.episode.clone(),
            files: self.files.iter().map(MediaFile::display_path).collect(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn attach_fonts(&self) -> Result<(), JobError> {
        let fonts: Vec<_> = self.ctx.fonts.iter().map(|f| f.display_path()).collect();
        let target = self.output_str();
        let cmd = attach_fonts_command(self.ctx.tools.mkvpropedit.clone(), &target, &fonts);

        let output = self.invoke(Stage::Fonts, cmd)?;
        if output.success() {
            return Ok(());
        }

        Err(JobError::FontAttach {
            episode: self.episode.clone(),
            target,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run one tool, mapping launch problems onto the job's error kinds.
    /// A non-zero exit is returned as output, not as an error.
    fn invoke(&self, stage: Stage, mut cmd: ToolCommand) -> Result<ToolOutput, JobError> {
        if let Some(limit) = self.ctx.tools.timeout {
            cmd.timeout(limit);
        }

        self.ctx.invoker.invoke(&cmd).map_err(|e| match e {
            seasonmux_av::Error::Timeout { timeout, .. } => JobError::Timeout {
                stage,
                episode: self.episode.clone(),
                timeout,
            },
            other => JobError::Spawn {
                stage,
                episode: self.episode.clone(),
                message: other.to_string(),
            },
        })
    }

    fn fail(mut self, state: JobState, error: JobError) -> JobOutcome {
        warn!("{}", error);
        self.transition(state);
        self.report(&error.stage().error());
        self.ctx.status.report_error(error.to_record());
        self.finish(Some(error))
    }

    fn finish(self, error: Option<JobError>) -> JobOutcome {
        JobOutcome {
            episode: self.episode,
            state: self.state,
            output: self.output,
            files: self.files,
            error,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Episode {}: {:?} -> {:?}", self.episode, self.state, next);
        self.state = next;
    }

    fn report(&self, label: &str) {
        self.ctx.status.report(&self.episode, label, &self.files);
    }

    fn output_str(&self) -> String {
        self.output.display().to_string()
    }
}
