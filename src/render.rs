//! # Fixed-width, colorized rendering of stack events.
//!
//! One line per event: timestamp, stack name, logical resource id,
//! resource type, status, reason. Columns are padded to fixed visible
//! widths with a two-space gutter; padding is computed on the uncolored
//! text using east-Asian-aware display width, so wide glyphs stay
//! aligned. The reason column is unbounded.

use std::fmt::Write;

use chrono::SecondsFormat;
use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use crate::event::{ResourceStatus, StackEvent};

/// Formats one event as an aligned, colorized line.
pub fn format_event(event: &StackEvent) -> String {
    let timestamp = event
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let status = event.resource_status.as_str();

    let mut line = String::new();
    pad_into(&mut line, &timestamp, timestamp.normal(), 20);
    pad_into(&mut line, &event.stack_name, event.stack_name.yellow(), 20);
    pad_into(
        &mut line,
        &event.logical_resource_id,
        event.logical_resource_id.yellow(),
        20,
    );
    pad_into(
        &mut line,
        &event.resource_type,
        event.resource_type.bright_black(),
        20,
    );
    pad_into(
        &mut line,
        status,
        paint_status(status, &event.resource_status),
        30,
    );
    line.push_str(event.resource_status_reason.as_deref().unwrap_or_default());
    line
}

/// Appends one padded column and its gutter; `raw` is the uncolored text
/// the visible width is measured on.
fn pad_into(line: &mut String, raw: &str, painted: ColoredString, width: usize) {
    let _ = write!(line, "{painted}");
    for _ in 0..width.saturating_sub(raw.width()) {
        line.push(' ');
    }
    line.push_str("  ");
}

/// Green for positive terminal statuses, red for negative ones, dim for
/// transitional ones.
fn paint_status(text: &str, status: &ResourceStatus) -> ColoredString {
    if status.is_positive() {
        text.green()
    } else if status.is_negative() {
        text.red()
    } else if status.is_in_progress() {
        text.bright_black()
    } else {
        text.normal()
    }
}
