//! Plain-text table rendering of a list state.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use client_core::{LoadStatus, ResourceState};
use shared::domain::{Document, Ingestion, User};

const MAX_CELL: usize = 40;

/// One table row per item.
pub trait Render {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        cell.to_string()
    } else {
        let kept: String = cell.chars().take(MAX_CELL - 1).collect();
        format!("{kept}…")
    }
}

impl Render for Document {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "STATUS", "SIZE", "CREATED"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.status.to_string(),
            human_size(self.size_bytes),
            timestamp(&self.created_at),
        ]
    }
}

impl Render for User {
    const HEADERS: &'static [&'static str] =
        &["ID", "NAME", "EMAIL", "ROLE", "STATUS", "LAST LOGIN"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.role.to_string(),
            self.status.to_string(),
            self.last_login_at
                .as_ref()
                .map(timestamp)
                .unwrap_or_else(|| "never".to_string()),
        ]
    }
}

impl Render for Ingestion {
    const HEADERS: &'static [&'static str] =
        &["ID", "DOCUMENT", "STATUS", "CHUNKS", "QUEUED", "RESULT"];

    fn cells(&self) -> Vec<String> {
        let result = match (&self.error, &self.finished_at) {
            (Some(error), _) => error.clone(),
            (None, Some(finished_at)) => format!("done {}", timestamp(finished_at)),
            (None, None) => "-".to_string(),
        };
        vec![
            self.id.to_string(),
            self.document_id.to_string(),
            self.status.to_string(),
            self.chunk_count.to_string(),
            timestamp(&self.queued_at),
            result,
        ]
    }
}

/// Table of the current page, a pager footer, and any error banner.
///
/// On error the last good page is still shown.
pub fn render_state<T: Render, F>(state: &ResourceState<T, F>) -> String {
    let mut out = String::new();

    if state.status == LoadStatus::Error {
        if let Some(error) = &state.error {
            let _ = writeln!(out, "! {error}");
            if error.requires_reauth() {
                let _ = writeln!(out, "! sign in again (--email/--password or --token)");
            } else {
                let _ = writeln!(out, "! type `refresh` to try again");
            }
        }
    }

    let Some(page) = &state.page else {
        if state.status == LoadStatus::Loading {
            out.push_str("loading…\n");
        } else {
            out.push_str("nothing loaded\n");
        }
        return out;
    };

    if page.is_empty() {
        out.push_str("no results\n");
    } else {
        let rows: Vec<Vec<String>> = page
            .items()
            .iter()
            .map(|item| item.cells().iter().map(|cell| truncate(cell)).collect())
            .collect();
        let mut widths: Vec<usize> = T::HEADERS.iter().map(|header| header.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let headers: Vec<String> = T::HEADERS.iter().map(|header| header.to_string()).collect();
        write_row(&mut out, &headers, &widths);
        for row in &rows {
            write_row(&mut out, row, &widths);
        }
    }

    let last = page.total_pages().max(1);
    let _ = writeln!(
        out,
        "page {}/{}{} · {} total · {} per page{}",
        state.query.page,
        last,
        if state.query.page > last { " (past the last page)" } else { "" },
        page.total(),
        state.query.limit,
        if state.is_loading() { " · loading…" } else { "" }
    );
    out
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}
