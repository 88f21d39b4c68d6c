//! Seasonmux - batch loose episode tracks into Matroska files
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod pipeline;
pub mod scanner;
pub mod state;
