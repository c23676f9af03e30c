//! UI module for profs - centralized styling, color detection, tables, spinners.
//!
//! # No-color detection (in priority order):
//! 1. `--no-color` CLI flag (highest priority)
//! 2. `NO_COLOR` environment variable (any value)
//! 3. `TERM=dumb` environment variable
//! 4. Non-TTY stdout (detected via anstream)
//!
//! `DEBUG` lines only appear with `--verbose` and go to stderr so they never
//! mix with output meant for pipes (`status-config`, `status-full`).

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
use comfy_table::{Cell, ContentArrangement, Table, presets};
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::io::IsTerminal;
use std::time::Duration;

use crate::model::Status;

/// Color mode for output
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Always emit ANSI colors
    Always,
    /// Emit colors only if TTY and not disabled
    #[default]
    Auto,
    /// Never emit ANSI colors
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            _ => Err(format!("invalid color mode: {}", s)),
        }
    }
}

/// UI context holding resolved display settings
#[derive(Debug, Clone)]
pub struct Ui {
    /// Whether colors are enabled
    pub color_enabled: bool,
    /// Whether spinners are enabled (requires TTY + color)
    pub spinner_enabled: bool,
    /// Whether DEBUG lines are printed
    pub verbose: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(ColorMode::Auto, false)
    }
}

impl Ui {
    /// Create a new UI context with color mode detection.
    pub fn new(mode: ColorMode, force_no_color: bool) -> Self {
        let color_enabled = Self::resolve_color(mode, force_no_color);
        let is_tty = std::io::stdout().is_terminal();
        let spinner_enabled = color_enabled && is_tty;

        if !color_enabled {
            anstream::ColorChoice::write_global(anstream::ColorChoice::Never);
        }

        Self {
            color_enabled,
            spinner_enabled,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn resolve_color(mode: ColorMode, force_no_color: bool) -> bool {
        if force_no_color {
            return false;
        }

        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
            return false;
        }

        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    // -------------------------------------------------------------------------
    // Labelled messages
    // -------------------------------------------------------------------------

    fn style_label(&self, color: AnsiColor) -> Style {
        if self.color_enabled {
            Style::new().fg_color(Some(Color::Ansi(color))).bold()
        } else {
            Style::new()
        }
    }

    /// Print OK label (green) with message to stdout
    pub fn ok(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Green);
        println!("{label}OK{label:#} {}", msg.as_ref());
    }

    /// Print WARN label (yellow) with message to stdout
    pub fn warn(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Yellow);
        println!("{label}WARN{label:#} {}", msg.as_ref());
    }

    /// Print ERROR label (red) with message to stderr
    pub fn err(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Red);
        eprintln!("{label}ERROR{label:#} {}", msg.as_ref());
    }

    /// Print INFO label (cyan) with message to stdout
    pub fn info(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Cyan);
        println!("{label}INFO{label:#} {}", msg.as_ref());
    }

    /// Print a dimmed DEBUG line to stderr when verbose
    pub fn debug(&self, msg: impl AsRef<str>) {
        if self.verbose {
            eprintln!("{}", self.dim(format!("DEBUG {}", msg.as_ref())));
        }
    }

    /// Return a styled string (dimmed/gray) - for inline use
    pub fn dim(&self, s: impl AsRef<str>) -> String {
        if self.color_enabled {
            let st = Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack)));
            format!("{st}{}{st:#}", s.as_ref())
        } else {
            s.as_ref().to_string()
        }
    }

    /// Return a styled string (bold) - for inline use
    pub fn bold(&self, s: impl AsRef<str>) -> String {
        if self.color_enabled {
            let st = Style::new().bold();
            format!("{st}{}{st:#}", s.as_ref())
        } else {
            s.as_ref().to_string()
        }
    }

    // -------------------------------------------------------------------------
    // Status icons (with fallback for no-color)
    // -------------------------------------------------------------------------

    pub fn icon_ok(&self) -> &'static str {
        if self.color_enabled { "✓" } else { "[OK]" }
    }

    pub fn icon_warn(&self) -> &'static str {
        if self.color_enabled { "⚠" } else { "[!]" }
    }

    pub fn icon_err(&self) -> &'static str {
        if self.color_enabled { "✗" } else { "[X]" }
    }

    // -------------------------------------------------------------------------
    // Tables (comfy-table)
    // -------------------------------------------------------------------------

    /// Create a simple table without borders (for lists)
    pub fn simple_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(presets::NOTHING);
        table
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    /// Create a styled header cell (bold when color enabled)
    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.add_attribute(comfy_table::Attribute::Bold)
        } else {
            cell
        }
    }

    /// Cell showing a path status: green when ok, red otherwise
    pub fn status_cell(&self, status: Status) -> Cell {
        let cell = Cell::new(status.tag());
        if !self.color_enabled {
            return cell;
        }
        if status.is_ok() {
            cell.fg(comfy_table::Color::Green)
        } else {
            cell.fg(comfy_table::Color::Red)
        }
    }

    // -------------------------------------------------------------------------
    // Spinners (indicatif)
    // -------------------------------------------------------------------------

    /// Create a spinner for longer operations.
    /// Returns a no-op spinner when disabled.
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        if !self.spinner_enabled {
            let pb = ProgressBar::hidden();
            pb.set_message(message);
            return pb;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Finish a spinner with a success message
    pub fn spinner_finish_ok(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        let msg: Cow<'static, str> = msg.into();
        pb.finish_and_clear();
        self.ok(msg);
    }

    /// Finish a spinner with an error message
    pub fn spinner_finish_err(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        let msg: Cow<'static, str> = msg.into();
        pb.finish_and_clear();
        self.err(msg);
    }

    // -------------------------------------------------------------------------
    // Println helpers (using anstream for proper tty handling)
    // -------------------------------------------------------------------------

    /// Print a line to stdout
    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    /// Print an empty line
    pub fn newline(&self) {
        println!();
    }

    /// Print a section header
    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }
}
