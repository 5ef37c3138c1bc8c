//! The default line format and its styling capability.

use owo_colors::OwoColorize;

use crate::ProgressInstance;

/// Styles the completion message of finished instances.
///
/// Swap in [`NoColor`] for terminals (or tests) without ANSI color support.
pub trait Colorize: Send + Sync {
    /// Styles the message of a successful instance.
    fn success(&self, text: &str) -> String;
    /// Styles the message of a failed instance.
    fn failure(&self, text: &str) -> String;
}

/// Green for success, red for failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiColors;

impl Colorize for AnsiColors {
    fn success(&self, text: &str) -> String {
        text.green().to_string()
    }

    fn failure(&self, text: &str) -> String {
        text.red().to_string()
    }
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColor;

impl Colorize for NoColor {
    fn success(&self, text: &str) -> String {
        text.to_string()
    }

    fn failure(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Formatter used for instances without a custom one.
///
/// Running instances render as `"<message> <frame>"` and consume one frame
/// per call. Finished instances render as `"<message>: <completion>"`.
pub struct DefaultFormat {
    colors: Box<dyn Colorize>,
}

impl Default for DefaultFormat {
    fn default() -> Self {
        Self::new(AnsiColors)
    }
}

impl DefaultFormat {
    pub fn new(colors: impl Colorize + 'static) -> Self {
        Self {
            colors: Box::new(colors),
        }
    }

    pub fn format(&self, instance: &ProgressInstance) -> String {
        match instance.is_stopped() {
            Some(success) => {
                let completion = instance.completion_message();
                let styled = match success {
                    true => self.colors.success(&completion),
                    false => self.colors.failure(&completion),
                };
                format!("{}: {}", instance.message(), styled)
            }
            None => format!("{} {}", instance.message(), instance.next_frame()),
        }
    }
}
