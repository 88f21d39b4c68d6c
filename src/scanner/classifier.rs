//! File classification for loose episode tracks.
//!
//! A file's role is decided by its extension alone:
//!
//! - **Container**: primary video files; the only source of episode numbers
//! - **Subtitle**: text subtitle tracks, muxed with language/track-name options
//! - **Track**: any other groupable media (external audio and so on)
//! - **Font**: attachments added to every merged episode
//! - **Other**: ignored
//!
//! Episode numbers are every maximal run of ASCII digits in the file name,
//! left-padded with zeros to two characters.

use super::Result;
use crate::config::ClassifyConfig;
use regex::Regex;
use seasonmux_av::MergeInput;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Zero-padded episode identifier, e.g. `"01"`, `"12"`, `"264"`.
///
/// Ordered numerically, then textually, so `"01"` sorts before `"001"`
/// and both before `"02"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeNumber(String);

impl EpisodeNumber {
    /// Build from a run of ASCII digits, padding to width 2.
    ///
    /// Runs longer than two digits are kept verbatim.
    pub fn from_digits(digits: &str) -> Self {
        Self(format!("{:0>2}", digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value. Runs too long for `u64` saturate.
    pub fn value(&self) -> u64 {
        self.0.parse().unwrap_or(u64::MAX)
    }
}

impl Ord for EpisodeNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(&other.value())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for EpisodeNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Container,
    Subtitle,
    Track,
    Font,
    Other,
}

/// A classified input file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// File name including extension.
    pub name: String,
    pub class: FileClass,
    /// Whether the file joins episode groups.
    pub groupable: bool,
    /// Padded digit runs, in order of appearance.
    pub numbers: Vec<EpisodeNumber>,
    /// Language token found in the name, lower-cased.
    pub language: Option<String>,
}

impl MediaFile {
    /// File name without its last extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn has_number(&self, number: &EpisodeNumber) -> bool {
        self.numbers.contains(number)
    }

    /// Multiplexer input for this file. Subtitles always carry a track name
    /// and carry a language when one was recognised.
    pub fn merge_input(&self) -> MergeInput {
        match self.class {
            FileClass::Subtitle => MergeInput {
                path: self.display_path(),
                language: self.language.clone(),
                track_name: Some(self.stem()),
            },
            _ => MergeInput::plain(self.display_path()),
        }
    }
}

/// A font file to embed into every merged episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAttachment {
    pub path: PathBuf,
}

impl FontAttachment {
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Classifies input files and builds episode groups.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    digits: Regex,
    token_split: Regex,
    container_extensions: HashSet<String>,
    media_extensions: HashSet<String>,
    subtitle_extensions: HashSet<String>,
    font_extensions: HashSet<String>,
    languages: HashSet<String>,
}

impl FileClassifier {
    pub fn new(config: &ClassifyConfig) -> Result<Self> {
        Ok(Self {
            digits: Regex::new(r"[0-9]+")?,
            token_split: Regex::new(r"[^A-Za-z0-9]+")?,
            container_extensions: to_set(&config.container_extensions),
            media_extensions: to_set(&config.media_extensions),
            subtitle_extensions: to_set(&config.subtitle_extensions),
            font_extensions: to_set(&config.font_extensions),
            languages: config
                .languages
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Classify a single path.
    pub fn classify(&self, path: &Path) -> MediaFile {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let class = if self.font_extensions.contains(&extension) {
            FileClass::Font
        } else if self.container_extensions.contains(&extension) {
            FileClass::Container
        } else if self.subtitle_extensions.contains(&extension) {
            FileClass::Subtitle
        } else if self.media_extensions.contains(&extension) {
            FileClass::Track
        } else {
            FileClass::Other
        };

        MediaFile {
            path: path.to_path_buf(),
            groupable: self.media_extensions.contains(&extension),
            numbers: self.digit_runs(&name),
            language: self.detect_language(&name),
            class,
            name,
        }
    }

    pub fn classify_all(&self, paths: &[PathBuf]) -> Vec<MediaFile> {
        paths.iter().map(|p| self.classify(p)).collect()
    }

    /// Distinct episode numbers found in container files, sorted ascending.
    pub fn episode_numbers(&self, files: &[MediaFile]) -> Vec<EpisodeNumber> {
        files
            .iter()
            .filter(|f| f.class == FileClass::Container)
            .flat_map(|f| f.numbers.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Font attachments in the order the files were listed.
    pub fn fonts(&self, files: &[MediaFile]) -> Vec<FontAttachment> {
        files
            .iter()
            .filter(|f| f.class == FileClass::Font)
            .map(|f| FontAttachment {
                path: f.path.clone(),
            })
            .collect()
    }

    /// Every groupable file whose digit runs include `number`. Containers
    /// come first so the video file is the merge's primary input; otherwise
    /// listing order is kept. A file appears at most once per group, but may
    /// belong to several groups.
    pub fn group(&self, files: &[MediaFile], number: &EpisodeNumber) -> Vec<MediaFile> {
        let mut group: Vec<MediaFile> = files
            .iter()
            .filter(|f| f.groupable && f.has_number(number))
            .cloned()
            .collect();
        group.sort_by_key(|f| f.class != FileClass::Container);
        group
    }

    /// First name token (split on non-alphanumerics) that is a known
    /// language code, compared case-insensitively.
    pub fn detect_language(&self, name: &str) -> Option<String> {
        self.token_split
            .split(name)
            .map(|token| token.to_ascii_lowercase())
            .find(|token| self.languages.contains(token))
    }

    fn digit_runs(&self, name: &str) -> Vec<EpisodeNumber> {
        self.digits
            .find_iter(name)
            .map(|m| EpisodeNumber::from_digits(m.as_str()))
            .collect()
    }
}

fn to_set(items: &[String]) -> HashSet<String> {
    items.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FileClassifier {
        FileClassifier::new(&ClassifyConfig::default()).unwrap()
    }

    fn files(names: &[&str]) -> Vec<MediaFile> {
        let paths: Vec<PathBuf> = names.iter().map(|n| Path::new("/in").join(n)).collect();
        classifier().classify_all(&paths)
    }

    fn ep(s: &str) -> EpisodeNumber {
        EpisodeNumber::from_digits(s)
    }

    #[test]
    fn test_padding() {
        assert_eq!(ep("1").as_str(), "01");
        assert_eq!(ep("12").as_str(), "12");
        assert_eq!(ep("264").as_str(), "264");
        assert_eq!(ep("001").as_str(), "001");
    }

    #[test]
    fn test_ordering_is_numeric() {
        let mut numbers = vec![ep("1080"), ep("10"), ep("2"), ep("264")];
        numbers.sort();
        let sorted: Vec<_> = numbers.iter().map(|n| n.as_str()).collect();
        assert_eq!(sorted, ["02", "10", "264", "1080"]);
    }

    #[test]
    fn test_classes() {
        let c = classifier();
        let class = |n: &str| c.classify(Path::new(n)).class;
        assert_eq!(class("ep01.mkv"), FileClass::Container);
        assert_eq!(class("ep01.ass"), FileClass::Subtitle);
        assert_eq!(class("ep01.mka"), FileClass::Track);
        assert_eq!(class("font.ttf"), FileClass::Font);
        assert_eq!(class("FONT.TTF"), FileClass::Font);
        assert_eq!(class("font.Ttf"), FileClass::Other);
        assert_eq!(class("notes.txt"), FileClass::Other);
        assert_eq!(class("README"), FileClass::Other);
    }

    #[test]
    fn test_episode_numbers_sorted_unique_containers_only() {
        let list = files(&[
            "Show - 02 [1080p].mkv",
            "Show - 01 [1080p].mkv",
            "Show - 01.ass",
            "Show - 07.mka",
            "Show - 02.mkv",
        ]);
        let numbers = classifier().episode_numbers(&list);
        let numbers: Vec<_> = numbers.iter().map(|n| n.as_str()).collect();
        assert_eq!(numbers, ["01", "02", "1080"]);
    }

    #[test]
    fn test_episode_numbers_empty_input() {
        assert!(classifier().episode_numbers(&[]).is_empty());
        assert!(classifier().fonts(&[]).is_empty());
    }

    #[test]
    fn test_fonts_keep_listing_order() {
        let list = files(&["z.ttf", "ep01.mkv", "a.otf", "b.TTF"]);
        let fonts: Vec<_> = classifier()
            .fonts(&list)
            .iter()
            .map(|f| f.display_path())
            .collect();
        assert_eq!(fonts, ["/in/z.ttf", "/in/a.otf", "/in/b.TTF"]);
    }

    #[test]
    fn test_group_collects_all_tracks_of_episode() {
        let list = files(&[
            "show.S01E01.mkv",
            "show.S01E01.eng.ass",
            "show.E02.mkv",
            "show.E01.jpn.mka",
            "font1.ttf",
            "E01.txt",
        ]);
        let group = classifier().group(&list, &ep("01"));
        let names: Vec<_> = group.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["show.S01E01.mkv", "show.S01E01.eng.ass", "show.E01.jpn.mka"]
        );
    }

    #[test]
    fn test_group_puts_containers_first() {
        // Sorted listing order puts the subtitle ahead of its video.
        let list = files(&["Show 01.eng.ass", "Show 01.mka", "Show 01.mkv"]);
        let group = classifier().group(&list, &ep("01"));
        let names: Vec<_> = group.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Show 01.mkv", "Show 01.eng.ass", "Show 01.mka"]);
    }

    #[test]
    fn test_repeated_token_joins_group_once() {
        let list = files(&["show.S01E01.mkv", "show.S01E01.eng.ass"]);
        let group = classifier().group(&list, &ep("01"));
        let names: Vec<_> = group.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["show.S01E01.mkv", "show.S01E01.eng.ass"]);
    }

    #[test]
    fn test_file_may_join_several_groups() {
        let list = files(&["show 03 04.mkv"]);
        let c = classifier();
        assert_eq!(c.group(&list, &ep("03")).len(), 1);
        assert_eq!(c.group(&list, &ep("04")).len(), 1);
        assert!(c.group(&list, &ep("05")).is_empty());
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let list = files(&["a 05.mkv", "a 05.eng.ass", "a 06.mkv"]);
        let c = classifier();
        assert_eq!(c.group(&list, &ep("05")), c.group(&list, &ep("05")));
    }

    #[test]
    fn test_detect_language() {
        let c = classifier();
        assert_eq!(c.detect_language("show.S01E01.eng.ass"), Some("eng".to_string()));
        assert_eq!(c.detect_language("show [RUS] 01.ass"), Some("rus".to_string()));
        assert_eq!(c.detect_language("Revenge 01.ass"), None);
        assert_eq!(c.detect_language("show 01.ass"), None);
    }

    #[test]
    fn test_merge_input_for_subtitles() {
        let list = files(&["show.S01E01.eng.ass", "show.S01E01.signs.ass", "show.S01E01.mkv"]);

        let eng = list[0].merge_input();
        assert_eq!(eng.language.as_deref(), Some("eng"));
        assert_eq!(eng.track_name.as_deref(), Some("show.S01E01.eng"));

        let signs = list[1].merge_input();
        assert_eq!(signs.language, None);
        assert_eq!(signs.track_name.as_deref(), Some("show.S01E01.signs"));

        let video = list[2].merge_input();
        assert_eq!(video, MergeInput::plain("/in/show.S01E01.mkv"));
    }
}
