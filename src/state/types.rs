use crate::scanner::{EpisodeNumber, MediaFile};
use std::fmt;

/// External stage of an episode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Merge,
    Fonts,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Merge => "Merge",
            Stage::Fonts => "Fonts",
        }
    }

    pub fn started(&self) -> String {
        format!("{}: started", self.name())
    }

    pub fn done(&self) -> String {
        format!("{}: done", self.name())
    }

    pub fn error(&self) -> String {
        format!("{}: error", self.name())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulated status history of one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub episode: EpisodeNumber,
    /// Stage labels in report order. Never shrinks.
    pub labels: Vec<String>,
    /// Files last reported for this episode.
    pub files: Vec<String>,
}

impl StatusRecord {
    pub fn new(episode: EpisodeNumber, label: &str, files: &[MediaFile]) -> Self {
        Self {
            episode,
            labels: vec![label.to_string()],
            files: file_paths(files),
        }
    }

    pub fn push(&mut self, label: &str, files: &[MediaFile]) {
        self.labels.push(label.to_string());
        self.files = file_paths(files);
    }

    /// Labels joined by newlines, as shown in the `Output` column.
    pub fn output_text(&self) -> String {
        self.labels.join("\n")
    }

    /// Files joined by newlines, as shown in the `Files` column.
    pub fn files_text(&self) -> String {
        self.files.join("\n")
    }

    pub fn last_label(&self) -> Option<&str> {
        self.labels.last().map(|s| s.as_str())
    }
}

fn file_paths(files: &[MediaFile]) -> Vec<String> {
    files.iter().map(|f| f.display_path()).collect()
}

/// A failure captured from one stage of one episode.
///
/// The text carries the stage label, the episode number and whatever the
/// tool printed, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub episode: EpisodeNumber,
    pub stage: Stage,
    pub text: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single status change, handed to sinks in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub episode: EpisodeNumber,
    pub label: String,
    pub files: Vec<String>,
}
