//! # seasonmux-av
//!
//! External tool plumbing for seasonmux.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]) -- synchronous builder with
//!   optional deadline for running external processes, and the
//!   [`ToolInvoker`] seam used by callers that want to swap the process
//!   backend out.
//! - **MKVToolNix commands** ([`mkvtoolnix`]) -- argument vectors for
//!   `mkvmerge` and `mkvpropedit`.
//! - **Tool discovery** ([`check_tool`], [`require_tool`]) -- find the
//!   programs on `PATH` or at configured locations.
//! - **Templates** ([`TemplateContext`]) -- `{var}` substitution for output
//!   file names.
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support

pub mod command;
mod error;
pub mod mkvtoolnix;
pub mod template;
pub mod tools;

// Re-exports
pub use command::{ProcessInvoker, ToolCommand, ToolInvoker, ToolOutput};
pub use error::{Error, Result};
pub use mkvtoolnix::{attach_fonts_command, merge_command, MergeInput};
pub use template::{TemplateContext, DEFAULT_OUTPUT_TEMPLATE};
pub use tools::{check_tool, check_tool_at, check_tools, get_tool_path, require_tool, ToolInfo};
