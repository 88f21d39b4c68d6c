use seasonmux_av::DEFAULT_OUTPUT_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub classify: ClassifyConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Flat directory holding every loose track of the season
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving the merged episodes
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConfig {
    /// Series name used as `{base}` in the output template
    #[serde(default = "default_base_name")]
    pub base_name: String,

    /// Season identifier used as `{season}`, taken verbatim
    #[serde(default = "default_season")]
    pub season: String,

    /// Output file name template. Variables: `{base}`, `{season}`, `{episode}`
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_base_name() -> String {
    "Output".to_string()
}
fn default_season() -> String {
    "01".to_string()
}
fn default_template() -> String {
    DEFAULT_OUTPUT_TEMPLATE.to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            base_name: default_base_name(),
            season: default_season(),
            template: default_template(),
        }
    }
}

/// Extension and token tables driving classification.
///
/// Extensions are written without the leading dot and compared
/// case-sensitively.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyConfig {
    /// Primary container extensions; only these yield episode numbers
    #[serde(default = "default_container_extensions")]
    pub container_extensions: Vec<String>,

    /// Extensions grouped into an episode and passed to the multiplexer
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,

    /// Extensions treated as subtitle tracks (language + track name options)
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,

    /// Extensions attached as fonts
    #[serde(default = "default_font_extensions")]
    pub font_extensions: Vec<String>,

    /// Three-letter language tokens recognised in subtitle file names
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Largest accepted gap between neighbouring episode numbers
    #[serde(default = "default_max_gap")]
    pub max_gap: u64,
}

fn default_container_extensions() -> Vec<String> {
    strings(&["mkv"])
}
fn default_media_extensions() -> Vec<String> {
    strings(&["mkv", "mka", "ass", "ssa", "srt"])
}
fn default_subtitle_extensions() -> Vec<String> {
    strings(&["ass", "ssa", "srt"])
}
fn default_font_extensions() -> Vec<String> {
    strings(&["ttf", "TTF", "otf", "OTF"])
}
fn default_languages() -> Vec<String> {
    strings(&[
        "eng", "jpn", "rus", "ukr", "ger", "deu", "fre", "fra", "spa", "ita", "por", "chi", "zho",
        "kor",
    ])
}
fn default_max_gap() -> u64 {
    5
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            container_extensions: default_container_extensions(),
            media_extensions: default_media_extensions(),
            subtitle_extensions: default_subtitle_extensions(),
            font_extensions: default_font_extensions(),
            languages: default_languages(),
            max_gap: default_max_gap(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit path to mkvmerge (falls back to PATH)
    #[serde(default)]
    pub mkvmerge: Option<PathBuf>,

    /// Explicit path to mkvpropedit (falls back to PATH)
    #[serde(default)]
    pub mkvpropedit: Option<PathBuf>,

    /// Per-invocation deadline in seconds. Unset waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Clear the terminal and redraw the full status table on every report
    #[default]
    Table,
    /// Append one log line per report
    Log,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Worker count. Defaults to the number of logical CPUs.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Exit non-zero when any episode recorded an error
    #[serde(default)]
    pub strict: bool,

    /// Pause after each table redraw, in milliseconds
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    #[serde(default)]
    pub progress: ProgressMode,
}

fn default_refresh_ms() -> u64 {
    250
}

impl RunConfig {
    pub fn worker_count(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            strict: false,
            refresh_ms: default_refresh_ms(),
            progress: ProgressMode::default(),
        }
    }
}
