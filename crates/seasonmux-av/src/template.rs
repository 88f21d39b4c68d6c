//! Variable substitution for output file names.

use std::collections::HashMap;

/// Default output name: `<base> - S<season>E<episode>.mkv`.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{base} - S{season}E{episode}.mkv";

/// Variable substitution context for output name templates.
///
/// Supports variable substitution in strings using the `{varname}` syntax.
///
/// # Example
///
/// ```
/// use seasonmux_av::TemplateContext;
///
/// let ctx = TemplateContext::new()
///     .with_episode("Base", "01", "07")
///     .with_var("group", "subs");
///
/// assert_eq!(ctx.substitute("{base} - S{season}E{episode}.mkv"), "Base - S01E07.mkv");
/// assert_eq!(ctx.substitute("[{group}] {base}"), "[subs] Base");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    /// Set episode naming variables.
    ///
    /// This adds the following variables:
    /// - `{base}` - Output base name
    /// - `{season}` - Season identifier as configured
    /// - `{episode}` - Zero-padded episode number
    pub fn with_episode(mut self, base: &str, season: &str, episode: &str) -> Self {
        self.set("base", base);
        self.set("season", season);
        self.set("episode", episode);
        self
    }

    /// Add a custom variable.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute variables in a string.
    ///
    /// Variables are in the form `{varname}`. Unknown variables are left as-is.
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.vars {
            result = result.replace(&format!("{{{}}}", key), value);
        }
        result
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self::new()
    }
}
