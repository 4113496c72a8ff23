use std::fmt::Write;
use std::io::{self, IsTerminal};

use console::Style;
use siteforge_domain::{Notification, RunReport};

mod error;
mod options;

pub use error::ReportError;
pub use options::{ColorChoice, OutputFormat, RenderOptions};

const LABEL_WIDTH: usize = 12;

/// Render a run report in the requested output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_report(
    report: &RunReport,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String, ReportError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|source| ReportError::JsonSerialize { source }),
        OutputFormat::Text => Ok(render_report_text(report, options)),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn render_report_text(report: &RunReport, options: &RenderOptions) -> String {
    let mut output = String::new();
    let style = TextStyle::new(options.color);
    let target = options
        .target
        .clone()
        .or_else(|| report.target.as_ref().map(ToString::to_string));

    append_header(
        &mut output,
        report.operation.label(),
        target.as_deref(),
        &style,
    );
    if options.verbose {
        let _ = writeln!(
            output,
            "  {}",
            style.dim(&format!("source: {}", report.source.display()))
        );
    }

    let (changes, quiet): (Vec<&Notification>, Vec<&Notification>) = report
        .notifications
        .iter()
        .partition(|notification| !notification.is_verbose());
    let summaries: Vec<&Notification> = changes
        .iter()
        .copied()
        .filter(|notification| Class::of(notification) == Class::Summary)
        .collect();

    if report.notifications.is_empty() && report.errors.is_empty() {
        let _ = writeln!(output, "  Nothing to do.");
        return output;
    }

    let _ = writeln!(output);
    append_errors(&mut output, &report.errors, &style);
    for notification in &changes {
        if Class::of(notification) != Class::Summary {
            append_notification_line(&mut output, notification, &style);
        }
    }
    if options.verbose {
        for notification in &quiet {
            append_notification_line(&mut output, notification, &style);
        }
    } else if !quiet.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "  {}",
            style.dim(&format!("{} unchanged or informational", quiet.len()))
        );
    }

    if !report.injected_custom_actions.is_empty() {
        let _ = writeln!(output);
        for title in &report.injected_custom_actions {
            let _ = writeln!(
                output,
                "  {} {}{}",
                style.change_symbol("~"),
                TextStyle::pad_label(&style.change_label("injected")),
                style.primary_text(title)
            );
        }
    }

    if !summaries.is_empty() {
        let _ = writeln!(output);
        for summary in summaries {
            let _ = writeln!(output, "  {}", style.primary_text(&summary.detail));
        }
    }

    let _ = writeln!(output);
    let tally = Tally::from_report(report);
    let _ = writeln!(output, "{}", tally.format(&style));
    output
}

fn append_header(output: &mut String, command: &str, target: Option<&str>, style: &TextStyle) {
    let _ = write!(output, "{}", style.header_command(command));
    if let Some(target) = target {
        let _ = write!(output, " {}", style.header_target(target));
    }
    let _ = writeln!(output);
}

fn append_notification_line(output: &mut String, notification: &Notification, style: &TextStyle) {
    let (symbol, label) = match Class::of(notification) {
        Class::Added => (style.add_symbol("+"), style.add_label("create")),
        Class::Changed => (style.change_symbol("~"), style.change_label("change")),
        Class::Removed => (style.remove_symbol("-"), style.remove_label("delete")),
        Class::Unchanged => (style.noop_symbol("="), style.noop_label("unchanged")),
        Class::Info | Class::Summary => (style.dim("·"), style.dim("info")),
    };
    let _ = writeln!(
        output,
        "  {symbol} {}{}",
        TextStyle::pad_label(&label),
        if notification.is_verbose() {
            style.dim(&notification.detail)
        } else {
            style.primary_text(&notification.detail)
        }
    );
}

fn append_errors(output: &mut String, errors: &[String], style: &TextStyle) {
    if errors.is_empty() {
        return;
    }
    for error in errors {
        let _ = writeln!(output, "  {} {error}", style.error_prefix("error:"));
    }
    let _ = writeln!(output);
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Added,
    Changed,
    Removed,
    Unchanged,
    Info,
    Summary,
}

impl Class {
    fn of(notification: &Notification) -> Self {
        let detail = notification.detail.as_str();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|prefix| detail.starts_with(prefix));
        if starts(&["Successfully "]) {
            Self::Summary
        } else if starts(&["Created ", "Activated "]) {
            Self::Added
        } else if starts(&["Updated ", "Applied ", "Set ", "Deactivated "]) {
            Self::Changed
        } else if starts(&["Deleted "]) {
            Self::Removed
        } else if detail.ends_with(" already exists")
            || detail.ends_with(" does not exist")
            || detail.contains(" is already ")
            || detail.ends_with(" is not active")
        {
            Self::Unchanged
        } else {
            Self::Info
        }
    }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

struct Tally {
    added: usize,
    changed: usize,
    removed: usize,
    unchanged: usize,
    errors: usize,
}

impl Tally {
    fn from_report(report: &RunReport) -> Self {
        let mut tally = Self {
            added: 0,
            changed: 0,
            removed: 0,
            unchanged: 0,
            errors: report.errors.len(),
        };
        for notification in &report.notifications {
            match Class::of(notification) {
                Class::Added => tally.added += 1,
                Class::Changed => tally.changed += 1,
                Class::Removed => tally.removed += 1,
                Class::Unchanged => tally.unchanged += 1,
                Class::Info | Class::Summary => {}
            }
        }
        tally
    }

    fn format(&self, style: &TextStyle) -> String {
        let mut parts = Vec::new();
        if self.added > 0 {
            parts.push(style.add_label(&format!("{} created", self.added)));
        }
        if self.changed > 0 {
            parts.push(style.change_label(&format!("{} changed", self.changed)));
        }
        if self.removed > 0 {
            parts.push(style.remove_label(&format!("{} deleted", self.removed)));
        }
        if self.errors > 0 {
            parts.push(style.error_op_label(&format!("{} error", self.errors)));
        }
        if self.unchanged > 0 {
            parts.push(style.dim(&format!("{} unchanged", self.unchanged)));
        }
        if parts.is_empty() {
            format!("{} nothing to do", style.tally_label("Run:"))
        } else {
            format!("{} {}", style.tally_label("Run:"), parts.join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// TextStyle
// ---------------------------------------------------------------------------

struct TextStyle {
    color_enabled: bool,
    add_style: Style,
    change_style: Style,
    remove_style: Style,
    noop_style: Style,
    error_label_style: Style,
    primary_style: Style,
    dim_style: Style,
    header_cmd_style: Style,
    header_target_style: Style,
    error_prefix_style: Style,
    tally_label_style: Style,
}

impl TextStyle {
    fn new(choice: ColorChoice) -> Self {
        Self {
            color_enabled: should_color(choice),
            add_style: Style::new().green(),
            change_style: Style::new().cyan(),
            remove_style: Style::new().yellow(),
            noop_style: Style::new().dim(),
            error_label_style: Style::new().red(),
            primary_style: Style::new().white(),
            dim_style: Style::new().dim(),
            header_cmd_style: Style::new().white().bold(),
            header_target_style: Style::new().dim(),
            error_prefix_style: Style::new().red().bold(),
            tally_label_style: Style::new().white().bold(),
        }
    }

    fn paint<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if self.color_enabled {
            style.clone().force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn pad_label(painted: &str) -> String {
        let visible_len = console::measure_text_width(painted);
        if visible_len < LABEL_WIDTH {
            format!("{painted}{}", " ".repeat(LABEL_WIDTH - visible_len))
        } else {
            format!("{painted} ")
        }
    }

    fn add_symbol(&self, s: &str) -> String {
        self.paint(&self.add_style.clone().bold(), s)
    }
    fn change_symbol(&self, s: &str) -> String {
        self.paint(&self.change_style.clone().bold(), s)
    }
    fn remove_symbol(&self, s: &str) -> String {
        self.paint(&self.remove_style.clone().bold(), s)
    }
    fn noop_symbol(&self, s: &str) -> String {
        self.paint(&self.noop_style, s)
    }

    fn add_label(&self, s: &str) -> String {
        self.paint(&self.add_style, s)
    }
    fn change_label(&self, s: &str) -> String {
        self.paint(&self.change_style, s)
    }
    fn remove_label(&self, s: &str) -> String {
        self.paint(&self.remove_style, s)
    }
    fn noop_label(&self, s: &str) -> String {
        self.paint(&self.noop_style, s)
    }
    fn error_op_label(&self, s: &str) -> String {
        self.paint(&self.error_label_style, s)
    }

    fn primary_text(&self, s: &str) -> String {
        self.paint(&self.primary_style, s)
    }
    fn dim(&self, s: &str) -> String {
        self.paint(&self.dim_style, s)
    }

    fn header_command(&self, s: &str) -> String {
        self.paint(&self.header_cmd_style, s)
    }
    fn header_target(&self, s: &str) -> String {
        self.paint(&self.header_target_style, s)
    }

    fn error_prefix(&self, s: &str) -> String {
        self.paint(&self.error_prefix_style, s)
    }

    fn tally_label(&self, s: &str) -> String {
        self.paint(&self.tally_label_style, s)
    }
}

fn should_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stdout().is_terminal(),
    }
}

#[cfg(test)]
mod tests;
