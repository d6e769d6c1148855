//! Operator-facing terminal output.

use console::{Emoji, Term, style};

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
static ARROW: Emoji<'_, '_> = Emoji("▶ ", "> ");

/// Styled output on stdout, errors on stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    out: Term,
    err: Term,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    fn line(&self, text: &str) {
        // A closed stdout must not abort a release run.
        let _ = self.out.write_line(text);
    }

    /// Detail line, only in verbose mode.
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.line(&style(message).dim().to_string());
        }
    }

    pub fn progress(&self, message: &str) {
        if !self.quiet {
            self.line(&format!("{ARROW}{message}"));
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line(&format!("{CHECK}{}", style(message).green()));
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            self.line(&format!("{WARN}{}", style(message).yellow()));
        }
    }

    /// Always printed, on stderr.
    pub fn error(&self, message: &str) {
        let _ = self
            .err
            .write_line(&format!("{CROSS}{}", style(message).red().bold()));
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            self.line("");
            self.line(&style(title).bold().cyan().to_string());
        }
    }

    pub fn indent(&self, message: &str) {
        if !self.quiet {
            self.line(&format!("   {message}"));
        }
    }

    /// Printed even in quiet mode.
    pub fn summary(&self, message: &str) {
        self.line(message);
    }
}
