pub mod report;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::board::Board;
use crate::engine::{DisplayMode, FilterState, Leaderboard, Row, RowMarker};
use crate::utils::format_count;

pub const NO_RESULTS_MESSAGE: &str = "No matching records found.";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading data.";
pub const PROFILE_ICON: &str = "👤";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportFilter {
    pub search: String,
    pub types: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportBody {
    Ready { leaderboard: Leaderboard },
    LoadFailed { message: String },
}

/// Everything a renderer needs: the two labels and the leaderboard area.
/// Labels stay `None` when the load failed.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub team_total: Option<u64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub filter: Option<ReportFilter>,
    #[serde(flatten)]
    pub body: ReportBody,
}

impl Report {
    pub fn ready(board: &Board, filter: &FilterState, leaderboard: Leaderboard) -> Self {
        Self {
            team_total: Some(board.team_total()),
            last_updated: board.last_modified(),
            filter: Some(ReportFilter {
                search: filter.search.clone(),
                types: filter.types.iter().map(|t| t.to_string()).collect(),
            }),
            body: ReportBody::Ready { leaderboard },
        }
    }

    pub fn load_failed() -> Self {
        Self {
            team_total: None,
            last_updated: None,
            filter: None,
            body: ReportBody::LoadFailed {
                message: LOAD_ERROR_MESSAGE.to_string(),
            },
        }
    }

    pub fn team_total_label(&self) -> Option<String> {
        self.team_total.map(team_total_label)
    }

    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated.map(last_updated_label)
    }
}

pub fn team_total_label(total: u64) -> String {
    format!("Team Total: {} fields", format_count(total))
}

pub fn last_updated_label(at: DateTime<Utc>) -> String {
    format!("Last Updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))
}

pub fn marker_text(marker: RowMarker) -> String {
    match marker {
        RowMarker::Rank { position, .. } => format!("#{position}"),
        RowMarker::Icon => PROFILE_ICON.to_string(),
    }
}

fn paint(text: &str, color: bool, style: impl Fn(&str) -> ColoredString) -> String {
    if color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn paint_marker(row: &Row, color: bool) -> String {
    let text = format!("{:>4}", marker_text(row.marker));
    match row.marker {
        RowMarker::Rank {
            position,
            podium: true,
        } => match position {
            1 => paint(&text, color, |s| s.yellow().bold()),
            2 => paint(&text, color, |s| s.bright_white().bold()),
            _ => paint(&text, color, |s| s.truecolor(205, 127, 50).bold()),
        },
        RowMarker::Rank { .. } => paint(&text, color, |s| s.dimmed()),
        RowMarker::Icon => text,
    }
}

pub fn render_leaderboard_text(leaderboard: &Leaderboard, color: bool) -> String {
    let mut out = String::new();
    if leaderboard.is_empty() {
        out.push_str(&paint(NO_RESULTS_MESSAGE, color, |s| s.italic()));
        out.push('\n');
        return out;
    }

    let name_width = leaderboard
        .rows
        .iter()
        .map(|r| r.item.name.chars().count())
        .max()
        .unwrap_or(0);
    let profile = leaderboard.mode == DisplayMode::Profile;

    for row in leaderboard.rows.iter() {
        let padded_name = format!("{:<width$}", row.item.name, width = name_width);
        let name = if profile {
            paint(&padded_name, color, |s| s.cyan().bold())
        } else {
            paint(&padded_name, color, |s| s.bold())
        };
        out.push_str(&format!(
            "{}  {}  {} fields\n",
            paint_marker(row, color),
            name,
            paint(&format_count(row.item.filtered_score), color, |s| s.green().bold())
        ));
        if row.expanded {
            for a in row.item.assignments.iter() {
                out.push_str(&format!(
                    "        {} {}\n",
                    a.display_name,
                    paint(&a.count.to_string(), color, |s| s.bold())
                ));
            }
        }
    }
    out
}

pub fn render_text(report: &Report, color: bool) -> Vec<u8> {
    let mut out = String::new();
    if let Some(label) = report.team_total_label() {
        out.push_str(&label);
        out.push('\n');
    }
    if let Some(label) = report.last_updated_label() {
        out.push_str(&label);
        out.push('\n');
    }
    if !out.is_empty() {
        out.push('\n');
    }
    match &report.body {
        ReportBody::Ready { leaderboard } => {
            out.push_str(&render_leaderboard_text(leaderboard, color));
        }
        ReportBody::LoadFailed { message } => {
            out.push_str(&paint(message, color, |s| s.red().bold()));
            out.push('\n');
        }
    }
    out.into_bytes()
}

pub fn render_json(report: &Report) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(report).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

pub fn render_html(report: &Report) -> Vec<u8> {
    report::render_html(report)
}

pub fn render(report: &Report, format: OutputFormat, color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(report, color),
        OutputFormat::Json => render_json(report),
        OutputFormat::Html => render_html(report),
    }
}
