//! Color-aware diagnostic formatter
//!
//! Renders located diagnostics with a source snippet and carets. Respects the
//! NO_COLOR environment variable.

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Color mode for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Resolve to a termcolor ColorChoice
    pub fn to_color_choice(self) -> ColorChoice {
        // https://no-color.org
        if std::env::var_os("NO_COLOR").is_some() {
            return ColorChoice::Never;
        }
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto => ColorChoice::Auto,
        }
    }
}

/// Diagnostic formatter with color support
pub struct DiagnosticFormatter {
    color_mode: ColorMode,
}

impl DiagnosticFormatter {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Formatter that never emits color codes
    pub fn plain() -> Self {
        Self::new(ColorMode::Never)
    }

    /// Write a diagnostic to stdout
    pub fn emit(&self, diag: &Diagnostic) -> std::io::Result<()> {
        let mut stream = StandardStream::stdout(self.color_mode.to_color_choice());
        self.write_diagnostic(&mut stream, diag)
    }

    /// Write a diagnostic to a WriteColor sink
    pub fn write_diagnostic(&self, w: &mut impl WriteColor, diag: &Diagnostic) -> std::io::Result<()> {
        self.write_header(w, diag)?;
        self.write_location(w, diag)?;

        if !diag.snippet.is_empty() {
            self.write_snippet(w, diag)?;
        }

        // Enriched messages carry their explanation after a blank line
        if let Some((_, explanation)) = diag.message.split_once("\n\n") {
            for line in explanation.lines() {
                self.write_note(w, line)?;
            }
        }
        for note in &diag.notes {
            self.write_note(w, note)?;
        }
        if let Some(help) = &diag.help {
            self.write_help(w, help)?;
        }

        writeln!(w)?;
        Ok(())
    }

    fn level_color(level: DiagnosticLevel) -> Color {
        match level {
            DiagnosticLevel::Error => Color::Red,
            DiagnosticLevel::Warning => Color::Yellow,
            DiagnosticLevel::Hint => Color::Blue,
        }
    }

    fn write_header(&self, w: &mut impl WriteColor, diag: &Diagnostic) -> std::io::Result<()> {
        let headline = diag.message.split("\n\n").next().unwrap_or_default();

        w.set_color(
            ColorSpec::new()
                .set_fg(Some(Self::level_color(diag.level)))
                .set_bold(true),
        )?;
        write!(w, "{}[{}]", diag.level, diag.code)?;
        w.reset()?;

        w.set_color(ColorSpec::new().set_bold(true))?;
        write!(w, ": {}", headline)?;
        w.reset()?;
        writeln!(w)?;
        Ok(())
    }

    fn write_location(&self, w: &mut impl WriteColor, diag: &Diagnostic) -> std::io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(w, "  --> ")?;
        w.reset()?;
        writeln!(w, "{}:{}:{} [{}]", diag.file, diag.line, diag.column, diag.category)?;
        Ok(())
    }

    fn write_snippet(&self, w: &mut impl WriteColor, diag: &Diagnostic) -> std::io::Result<()> {
        let gutter_width = diag.line.to_string().len() + 1;
        let gutter = ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true).clone();

        w.set_color(&gutter)?;
        write!(w, "{:>width$}|", "", width = gutter_width)?;
        w.reset()?;
        writeln!(w)?;

        w.set_color(&gutter)?;
        write!(w, "{:>width$}| ", diag.line, width = gutter_width)?;
        w.reset()?;
        writeln!(w, "{}", diag.snippet)?;

        w.set_color(&gutter)?;
        write!(w, "{:>width$}| ", "", width = gutter_width)?;
        w.reset()?;

        let col = diag.column.saturating_sub(1);
        let padding = display_width(&diag.snippet, col);
        write!(w, "{}", " ".repeat(padding))?;

        let caret_len = diag
            .length
            .min(diag.snippet.len().saturating_sub(col))
            .max(1);
        w.set_color(
            ColorSpec::new()
                .set_fg(Some(Self::level_color(diag.level)))
                .set_bold(true),
        )?;
        write!(w, "{}", "^".repeat(caret_len))?;
        if !diag.label.is_empty() {
            write!(w, " {}", diag.label)?;
        }
        w.reset()?;
        writeln!(w)?;
        Ok(())
    }

    fn write_note(&self, w: &mut impl WriteColor, note: &str) -> std::io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(w, "   = ")?;
        w.reset()?;
        w.set_color(ColorSpec::new().set_bold(true))?;
        write!(w, "note")?;
        w.reset()?;
        writeln!(w, ": {}", note)?;
        Ok(())
    }

    fn write_help(&self, w: &mut impl WriteColor, help: &str) -> std::io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(w, "   = ")?;
        w.reset()?;
        w.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        write!(w, "help")?;
        w.reset()?;
        writeln!(w, ": {}", help)?;
        Ok(())
    }

    /// Render a diagnostic into a plain string (used by tests and `--color never`)
    pub fn format_to_string(&self, diag: &Diagnostic) -> String {
        let mut buf = termcolor::Buffer::no_color();
        if self.write_diagnostic(&mut buf, diag).is_err() {
            return diag.to_human_string();
        }
        String::from_utf8_lossy(buf.as_slice()).into_owned()
    }
}

/// Display width of the first `byte_col` bytes of a line
fn display_width(line: &str, byte_col: usize) -> usize {
    line.char_indices().take_while(|(idx, _)| *idx < byte_col).count()
}
