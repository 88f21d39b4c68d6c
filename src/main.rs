mod cli;

use seasonmux::{
    config::{self, Config, ProgressMode},
    pipeline::{DryRunInvoker, JobContext, Orchestrator, ResolvedTools},
    scanner::{self, EpisodeNumber, FileClassifier, FontAttachment, MediaFile},
    state::{LogSink, StatusAggregator, StatusSink, TableSink},
};
use seasonmux_av::{
    get_tool_path,
    tools::{MKVMERGE, MKVPROPEDIT},
    ProcessInvoker, ToolInvoker,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Overrides, Progress};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "seasonmux=debug,seasonmux_av=debug".to_string()
        } else {
            "seasonmux=info,seasonmux_av=info".to_string()
        }
    });

    // Logs go to stderr; stdout belongs to the status table and the report.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            overrides,
            progress,
            dry_run,
            strict,
        } => {
            let mut config = load_settings(cli.config.as_deref(), &overrides)?;
            if let Some(progress) = progress {
                config.run.progress = match progress {
                    Progress::Table => ProgressMode::Table,
                    Progress::Log => ProgressMode::Log,
                };
            }
            config.run.strict |= strict;
            run_batch(config, dry_run)
        }
        Commands::Scan { overrides } => {
            let config = load_settings(cli.config.as_deref(), &overrides)?;
            scan(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("seasonmux {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Config file (or defaults) with command-line overrides applied on top.
fn load_settings(config_path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(ref input) = overrides.input {
        config.paths.input_dir = input.clone();
    }
    if let Some(ref output) = overrides.output {
        config.paths.output_dir = output.clone();
    }
    if let Some(ref base_name) = overrides.base_name {
        config.naming.base_name = base_name.clone();
    }
    if let Some(ref season) = overrides.season {
        config.naming.season = season.clone();
    }
    if overrides.jobs.is_some() {
        config.run.jobs = overrides.jobs;
    }
    if overrides.timeout.is_some() {
        config.tools.timeout_secs = overrides.timeout;
    }

    config::validate_config(&config)?;
    Ok(config)
}

/// Classified input directory and the episode numbers a run will process.
struct Plan {
    input_dir: PathBuf,
    classifier: FileClassifier,
    files: Vec<MediaFile>,
    fonts: Vec<FontAttachment>,
    discovered: Vec<EpisodeNumber>,
    episodes: Vec<EpisodeNumber>,
}

fn plan(config: &Config) -> Result<Plan> {
    let input_dir = config
        .paths
        .input_dir
        .canonicalize()
        .with_context(|| format!("Input directory does not exist: {:?}", config.paths.input_dir))?;
    if !input_dir.is_dir() {
        anyhow::bail!("Input path is not a directory: {:?}", input_dir);
    }

    let classifier = FileClassifier::new(&config.classify)?;
    let paths = scanner::list_input_files(&input_dir)?;
    let files = classifier.classify_all(&paths);
    let fonts = classifier.fonts(&files);
    let discovered = classifier.episode_numbers(&files);

    let episodes = if discovered.is_empty() {
        Vec::new()
    } else {
        scanner::filter_episode_numbers(&discovered, config.classify.max_gap)?
    };

    tracing::info!(
        "Found {} file(s), {} font(s), {} of {} episode number(s) accepted",
        files.len(),
        fonts.len(),
        episodes.len(),
        discovered.len()
    );

    Ok(Plan {
        input_dir,
        classifier,
        files,
        fonts,
        discovered,
        episodes,
    })
}

fn run_batch(config: Config, dry_run: bool) -> Result<ExitCode> {
    let plan = plan(&config)?;

    if plan.episodes.is_empty() {
        tracing::warn!("No episode numbers found in {:?}", plan.input_dir);
        println!("List of added fonts:");
        return Ok(ExitCode::SUCCESS);
    }

    let tools = resolve_tools(&config, !plan.fonts.is_empty(), dry_run)?;

    let output_dir = &config.paths.output_dir;
    if !dry_run {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    }

    let workers = config.run.worker_count();
    let header = run_header(&config, &plan.input_dir, workers);

    // Dry runs print command lines, which a redrawn table would wipe.
    let sink: Arc<dyn StatusSink> = match (config.run.progress, dry_run) {
        (ProgressMode::Table, false) => {
            Arc::new(TableSink::new(Duration::from_millis(config.run.refresh_ms)))
        }
        _ => Arc::new(LogSink),
    };
    let invoker: Arc<dyn ToolInvoker> = if dry_run {
        Arc::new(DryRunInvoker)
    } else {
        Arc::new(ProcessInvoker)
    };

    let ctx = JobContext {
        files: plan.files,
        fonts: plan.fonts,
        classifier: plan.classifier,
        naming: config.naming.clone(),
        output_dir: output_dir.clone(),
        tools,
        invoker,
        status: StatusAggregator::new(sink, header),
    };

    let summary = Orchestrator::new(ctx, workers).run(&plan.episodes)?;

    let mut stdout = std::io::stdout().lock();
    summary
        .write_report(&mut stdout)
        .context("Failed to write run report")?;

    tracing::info!(
        "Finished: {} episode(s) done, {} failed",
        summary.succeeded(),
        summary.failed()
    );

    if config.run.strict && summary.has_errors() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Locate both programs. The property editor is only required when there are
/// fonts to attach; a dry run falls back to bare program names.
fn resolve_tools(config: &Config, fonts_needed: bool, dry_run: bool) -> Result<ResolvedTools> {
    let resolve = |name: &str, configured: Option<&Path>, required: bool| -> Result<PathBuf> {
        match get_tool_path(name, configured) {
            Ok(path) => Ok(path),
            Err(_) if dry_run || !required => Ok(configured
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(name))),
            Err(e) => Err(e).with_context(|| format!("{} is required for this run", name)),
        }
    };

    Ok(ResolvedTools {
        mkvmerge: resolve(MKVMERGE, config.tools.mkvmerge.as_deref(), true)?,
        mkvpropedit: resolve(
            MKVPROPEDIT,
            config.tools.mkvpropedit.as_deref(),
            fonts_needed,
        )?,
        timeout: config.tools.timeout(),
    })
}

fn run_header(config: &Config, input_dir: &Path, workers: usize) -> String {
    format!(
        "Startup arguments:\n\
         \x20   Input: {}\n\
         \x20   Output: {}\n\
         \x20   Base name: {}\n\
         \x20   Season: {}\n\
         Info:\n\
         \x20   Version: {}\n\
         \x20   Media extensions: {:?}\n\
         \x20   Font extensions: {:?}\n\
         \x20   Threads: {}\n",
        input_dir.display(),
        config.paths.output_dir.display(),
        config.naming.base_name,
        config.naming.season,
        env!("CARGO_PKG_VERSION"),
        config.classify.media_extensions,
        config.classify.font_extensions,
        workers
    )
}

fn scan(config: &Config) -> Result<()> {
    let plan = plan(config)?;

    println!("Input: {}", plan.input_dir.display());
    println!(
        "Discovered episodes: {}",
        join_numbers(&plan.discovered)
    );
    println!("Accepted episodes: {}", join_numbers(&plan.episodes));

    for episode in &plan.episodes {
        println!("\nEpisode {}:", episode);
        for file in plan.classifier.group(&plan.files, episode) {
            match file.language {
                Some(ref lang) => println!("  {} [{:?}, {}]", file.name, file.class, lang),
                None => println!("  {} [{:?}]", file.name, file.class),
            }
        }
    }

    println!("\nFonts: {}", plan.fonts.len());
    for font in &plan.fonts {
        println!("  {}", font.display_path());
    }

    Ok(())
}

fn join_numbers(numbers: &[EpisodeNumber]) -> String {
    if numbers.is_empty() {
        return "(none)".to_string();
    }
    numbers
        .iter()
        .map(EpisodeNumber::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_tools(config: &Config) {
    println!("Checking external tools...\n");

    let tools = seasonmux_av::check_tools(
        config.tools.mkvmerge.as_deref(),
        config.tools.mkvpropedit.as_deref(),
    );
    let mut all_ok = true;

    for info in &tools {
        let status = if info.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, info.name);

        if let Some(ref version) = info.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = info.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install MKVToolNix to merge episodes.");
    }
}
