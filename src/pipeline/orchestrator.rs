//! Bounded worker pool running one [`EpisodeJob`] per episode number.

use super::{EpisodeJob, JobContext, JobOutcome, JobState};
use crate::scanner::{EpisodeNumber, FontAttachment};
use crate::state::ErrorRecord;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::info;

/// Dispatches episode jobs onto a fixed-size pool and waits for all of them.
pub struct Orchestrator {
    ctx: JobContext,
    workers: usize,
}

impl Orchestrator {
    pub fn new(ctx: JobContext, workers: usize) -> Self {
        Self {
            ctx,
            workers: workers.max(1),
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    /// Run one job per episode. Jobs are dispatched in `episodes` order and
    /// finish in whatever order the tools allow; a failed job never stops
    /// the others. Returns once every job is terminal and the status sink
    /// has drawn its last update.
    pub fn run(&self, episodes: &[EpisodeNumber]) -> Result<RunSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("seasonmux-job-{}", i))
            .build()
            .context("Failed to build worker pool")?;

        info!(
            "Dispatching {} episode job(s) on {} worker(s)",
            episodes.len(),
            self.workers
        );

        let ctx = &self.ctx;
        let results = Mutex::new(Vec::with_capacity(episodes.len()));

        pool.scope_fifo(|scope| {
            for (index, episode) in episodes.iter().enumerate() {
                let results = &results;
                scope.spawn_fifo(move |_| {
                    let outcome = EpisodeJob::new(ctx, episode.clone()).run();
                    debug_assert!(outcome.state.is_terminal());
                    results.lock().push((index, outcome));
                });
            }
        });

        self.ctx.status.finish();

        let mut results = results.into_inner();
        results.sort_by_key(|(index, _)| *index);

        Ok(RunSummary {
            outcomes: results.into_iter().map(|(_, outcome)| outcome).collect(),
            fonts: self.ctx.fonts.clone(),
            errors: self.ctx.status.drain_errors(),
        })
    }
}

/// What a run produced, in dispatch order.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
    pub fonts: Vec<FontAttachment>,
    pub errors: Vec<ErrorRecord>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == JobState::Done)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_failure()).count()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Font list followed by every captured error text.
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "List of added fonts:")?;
        for font in &self.fonts {
            writeln!(out, "\t{}", font.display_path())?;
        }

        for error in &self.errors {
            writeln!(out, "{}", error)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifyConfig, NamingConfig};
    use crate::pipeline::{JobError, ResolvedTools};
    use crate::scanner::FileClassifier;
    use crate::state::{NullSink, Stage, StatusAggregator};
    use seasonmux_av::{ToolCommand, ToolInvoker, ToolOutput};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Fails any command whose target output contains one of the markers.
    #[derive(Default)]
    struct ScriptedInvoker {
        fail_merge: Vec<String>,
        fail_fonts: Vec<String>,
        unavailable: bool,
        calls: Mutex<Vec<ToolCommand>>,
    }

    impl ScriptedInvoker {
        fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
            self.calls
                .lock()
                .iter()
                .filter(|c| c.program_name() == program)
                .cloned()
                .collect()
        }
    }

    impl ToolInvoker for ScriptedInvoker {
        fn invoke(&self, command: &ToolCommand) -> seasonmux_av::Result<ToolOutput> {
            self.calls.lock().push(command.clone());
            if self.unavailable {
                return Err(seasonmux_av::Error::tool_not_found(command.program_name()));
            }

            let args = command.get_args();
            let (target, markers) = match command.program_name().as_str() {
                "mkvmerge" => (&args[2], &self.fail_merge),
                _ => (&args[0], &self.fail_fonts),
            };

            if markers.iter().any(|m| target.contains(m.as_str())) {
                return Ok(ToolOutput {
                    exit_code: Some(2),
                    stdout: format!("Error: cannot write {}", target),
                    stderr: String::new(),
                });
            }

            Ok(ToolOutput {
                exit_code: Some(0),
                ..Default::default()
            })
        }
    }

    fn orchestrator(names: &[&str], invoker: Arc<ScriptedInvoker>) -> Orchestrator {
        let classifier = FileClassifier::new(&ClassifyConfig::default()).unwrap();
        let paths: Vec<PathBuf> = names.iter().map(|n| Path::new("/in").join(n)).collect();
        let files = classifier.classify_all(&paths);
        let fonts = classifier.fonts(&files);

        let ctx = JobContext {
            files,
            fonts,
            classifier,
            naming: NamingConfig {
                base_name: "Base".to_string(),
                ..NamingConfig::default()
            },
            output_dir: PathBuf::from("/out"),
            tools: ResolvedTools {
                mkvmerge: PathBuf::from("mkvmerge"),
                mkvpropedit: PathBuf::from("mkvpropedit"),
                timeout: None,
            },
            invoker,
            status: StatusAggregator::new(Arc::new(NullSink), ""),
        };

        Orchestrator::new(ctx, 4)
    }

    fn episodes(orch: &Orchestrator) -> Vec<EpisodeNumber> {
        let ctx = orch.context();
        crate::scanner::filter_episode_numbers(&ctx.classifier.episode_numbers(&ctx.files), 5)
            .unwrap()
    }

    fn ep(s: &str) -> EpisodeNumber {
        EpisodeNumber::from_digits(s)
    }

    #[test]
    fn test_single_episode_with_subtitle_and_font() {
        let invoker = Arc::new(ScriptedInvoker::default());
        let orch = orchestrator(
            &["show.S01E01.mkv", "show.S01E01.eng.ass", "font1.ttf"],
            invoker.clone(),
        );

        let summary = orch.run(&episodes(&orch)).unwrap();
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].state, JobState::Done);

        let merges = invoker.calls_to("mkvmerge");
        assert_eq!(merges.len(), 1);
        assert_eq!(
            merges[0].get_args(),
            [
                "--quiet",
                "-o",
                "/out/Base - S01E01.mkv",
                "/in/show.S01E01.mkv",
                "--language",
                "0:eng",
                "--track-name",
                "0:show.S01E01.eng",
                "/in/show.S01E01.eng.ass",
            ]
        );

        let edits = invoker.calls_to("mkvpropedit");
        assert_eq!(edits.len(), 1);
        assert_eq!(
            edits[0].get_args(),
            ["/out/Base - S01E01.mkv", "--add-attachment", "/in/font1.ttf"]
        );

        let record = orch.context().status.record(&ep("01")).unwrap();
        assert_eq!(
            record.labels,
            ["Merge: started", "Merge: done", "Fonts: started", "Fonts: done"]
        );
    }

    #[test]
    fn test_merge_failure_is_isolated() {
        let invoker = Arc::new(ScriptedInvoker {
            fail_merge: vec!["E05".to_string()],
            ..Default::default()
        });
        let orch = orchestrator(
            &["ep 04.mkv", "ep 05.mkv", "ep 06.mkv", "font.otf"],
            invoker.clone(),
        );

        let summary = orch.run(&[ep("04"), ep("05"), ep("06")]).unwrap();
        let states: Vec<_> = summary.outcomes.iter().map(|o| o.state).collect();
        assert_eq!(
            states,
            [JobState::Done, JobState::MergeFailed, JobState::Done]
        );
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].episode, ep("05"));
        assert_eq!(summary.errors[0].stage, Stage::Merge);
        assert!(summary.errors[0].text.contains("cannot write"));
        assert!(matches!(
            summary.outcomes[1].error,
            Some(JobError::Merge { exit_code: Some(2), .. })
        ));

        // No property edit for the failed episode.
        let edits = invoker.calls_to("mkvpropedit");
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|c| !c.get_args()[0].contains("E05")));

        let record = orch.context().status.record(&ep("05")).unwrap();
        assert_eq!(record.labels, ["Merge: started", "Merge: error"]);
    }

    #[test]
    fn test_no_fonts_means_no_property_edit() {
        let invoker = Arc::new(ScriptedInvoker::default());
        let orch = orchestrator(&["ep 01.mkv", "ep 02.mkv", "ep 02.ass"], invoker.clone());

        let summary = orch.run(&episodes(&orch)).unwrap();
        assert!(summary.outcomes.iter().all(|o| o.state == JobState::Done));
        assert!(invoker.calls_to("mkvpropedit").is_empty());
        assert!(!summary.has_errors());

        for record in orch.context().status.records() {
            assert_eq!(record.labels, ["Merge: started", "Merge: done"]);
        }
    }

    #[test]
    fn test_font_failure_is_terminal() {
        let invoker = Arc::new(ScriptedInvoker {
            fail_fonts: vec!["E02".to_string()],
            ..Default::default()
        });
        let orch = orchestrator(&["ep 01.mkv", "ep 02.mkv", "f.ttf"], invoker);

        let summary = orch.run(&[ep("01"), ep("02")]).unwrap();
        assert_eq!(summary.outcomes[0].state, JobState::Done);
        assert_eq!(summary.outcomes[1].state, JobState::FontFailed);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].stage, Stage::Fonts);

        let record = orch.context().status.record(&ep("02")).unwrap();
        assert_eq!(record.last_label(), Some("Fonts: error"));
    }

    #[test]
    fn test_missing_tool_fails_every_job_without_panicking() {
        let invoker = Arc::new(ScriptedInvoker {
            unavailable: true,
            ..Default::default()
        });
        let orch = orchestrator(&["ep 01.mkv", "ep 02.mkv"], invoker);

        let summary = orch.run(&[ep("01"), ep("02")]).unwrap();
        assert_eq!(summary.failed(), 2);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| matches!(o.error, Some(JobError::Spawn { .. }))));
    }

    #[test]
    fn test_outcomes_follow_dispatch_order() {
        let invoker = Arc::new(ScriptedInvoker::default());
        let names: Vec<String> = (1..=12).map(|i| format!("ep {:02}.mkv", i)).collect();
        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let orch = orchestrator(&names, invoker);

        let order = episodes(&orch);
        let summary = orch.run(&order).unwrap();
        let got: Vec<_> = summary.outcomes.iter().map(|o| o.episode.clone()).collect();
        assert_eq!(got, order);
    }

    #[test]
    fn test_write_report() {
        let invoker = Arc::new(ScriptedInvoker {
            fail_merge: vec!["E01".to_string()],
            ..Default::default()
        });
        let orch = orchestrator(&["ep 01.mkv", "a.ttf"], invoker);
        let summary = orch.run(&[ep("01")]).unwrap();

        let mut out = Vec::new();
        summary.write_report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("List of added fonts:\n\t/in/a.ttf\n"));
        assert!(text.contains("Merge: error\n01\n"));
    }
}
