//! # Diagnostics
//!
//! The page's log surface. Every entry is also emitted through `tracing`, so a
//! host with a subscriber installed sees the same stream the tests inspect.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// Where it happened: an element id, url or initializer name.
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    debug_enabled: bool,
}

impl Diagnostics {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            entries: Vec::new(),
            debug_enabled,
        }
    }

    pub fn push(&mut self, level: DiagnosticLevel, message: impl Into<String>, context: Option<&str>) {
        let message = message.into();
        let ctx = context.unwrap_or("-");
        match level {
            DiagnosticLevel::Error => tracing::error!(trellis.context = ctx, "{}", message),
            DiagnosticLevel::Warning => tracing::warn!(trellis.context = ctx, "{}", message),
            DiagnosticLevel::Info => tracing::info!(trellis.context = ctx, "{}", message),
            DiagnosticLevel::Debug => {
                tracing::debug!(trellis.context = ctx, "{}", message);
                if !self.debug_enabled {
                    return;
                }
            }
        }
        self.entries.push(Diagnostic {
            level,
            message,
            context: context.map(str::to_string),
        });
    }

    pub fn error(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(DiagnosticLevel::Error, message, context);
    }

    pub fn warn(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(DiagnosticLevel::Warning, message, context);
    }

    pub fn debug(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(DiagnosticLevel::Debug, message, context);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_entries_need_debug_mode() {
        let mut quiet = Diagnostics::new(false);
        quiet.debug("zone refreshed", Some("cart"));
        quiet.error("unable to locate zone 'x'", None);
        assert_eq!(quiet.entries().len(), 1);
        assert_eq!(quiet.errors().count(), 1);

        let mut verbose = Diagnostics::new(true);
        verbose.debug("zone refreshed", Some("cart"));
        assert_eq!(verbose.entries()[0].context.as_deref(), Some("cart"));
        assert_eq!(verbose.take().len(), 1);
        assert!(verbose.entries().is_empty());
    }
}
