//! Argument builders for the MKVToolNix programs.
//!
//! Only the command lines are built here; running them goes through
//! [`ToolInvoker`](crate::ToolInvoker).

use crate::ToolCommand;
use std::path::PathBuf;

/// One positional input to `mkvmerge` with its per-file track options.
///
/// The options apply to track `0` of that file, which is the only track of a
/// loose subtitle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    /// Path of the input file.
    pub path: String,
    /// Language code for `--language 0:<code>`.
    pub language: Option<String>,
    /// Track name for `--track-name 0:<name>`.
    pub track_name: Option<String>,
}

impl MergeInput {
    /// An input passed through without options.
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: None,
            track_name: None,
        }
    }
}

/// Build `mkvmerge --quiet -o <output> [opts] <file>...`.
pub fn merge_command(program: PathBuf, output: &str, inputs: &[MergeInput]) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.args(["--quiet", "-o", output]);

    for input in inputs {
        if let Some(ref lang) = input.language {
            cmd.arg("--language").arg(format!("0:{}", lang));
        }
        if let Some(ref name) = input.track_name {
            cmd.arg("--track-name").arg(format!("0:{}", name));
        }
        cmd.arg(input.path.as_str());
    }

    cmd
}

/// Build `mkvpropedit <target> [--add-attachment <font>]...`.
pub fn attach_fonts_command(program: PathBuf, target: &str, fonts: &[String]) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.arg(target);
    for font in fonts {
        cmd.arg("--add-attachment").arg(font.as_str());
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prepends_options_before_each_file() {
        let inputs = vec![
            MergeInput::plain("/in/show.S01E01.mkv"),
            MergeInput {
                path: "/in/show.S01E01.eng.ass".to_string(),
                language: Some("eng".to_string()),
                track_name: Some("show.S01E01.eng".to_string()),
            },
            MergeInput {
                path: "/in/show.S01E01.signs.ass".to_string(),
                language: None,
                track_name: Some("show.S01E01.signs".to_string()),
            },
        ];

        let cmd = merge_command(PathBuf::from("mkvmerge"), "/out/Base - S01E01.mkv", &inputs);
        assert_eq!(
            cmd.get_args(),
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
                "--track-name",
                "0:show.S01E01.signs",
                "/in/show.S01E01.signs.ass",
            ]
        );
    }

    #[test]
    fn attach_lists_every_font() {
        let fonts = vec!["/in/a.ttf".to_string(), "/in/b.otf".to_string()];
        let cmd = attach_fonts_command(PathBuf::from("mkvpropedit"), "/out/x.mkv", &fonts);
        assert_eq!(
            cmd.get_args(),
            [
                "/out/x.mkv",
                "--add-attachment",
                "/in/a.ttf",
                "--add-attachment",
                "/in/b.otf"
            ]
        );
    }

    #[test]
    fn attach_without_fonts_only_names_target() {
        let cmd = attach_fonts_command(PathBuf::from("mkvpropedit"), "/out/x.mkv", &[]);
        assert_eq!(cmd.get_args(), ["/out/x.mkv"]);
    }
}
