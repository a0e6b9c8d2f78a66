//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use chrono::{Local, TimeZone};
use colored::*;
use qkn_domain::{Distribution, Method, Problem, SearchResults, ServiceStatus, Solution, Timestamp};
use std::fmt::Display;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Placeholder for an empty live list
pub const NO_LIVE_UPDATES: &str = "No live updates yet.";

/// Placeholder for an empty history list
pub const NO_HISTORY: &str = "No history records.";

/// How much of a timestamp to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStyle {
    /// `HH:MM:SS`, used for live items
    TimeOfDay,
    /// `YYYY-MM-DD HH:MM:SS`, used for history items
    DateTime,
}

impl TimeStyle {
    fn pattern(self) -> &'static str {
        match self {
            TimeStyle::TimeOfDay => "%H:%M:%S",
            TimeStyle::DateTime => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// One-line form of a record, e.g. `[AI] What is 2+2? → 4`.
    pub fn summary_line(&self, problem: &Problem) -> String {
        format!(
            "{} {} → {}",
            self.method_tag(problem.method()),
            problem.question,
            problem.solution
        )
    }

    /// Format one record.
    pub fn format_problem(&self, problem: &Problem, style: TimeStyle) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(problem)?),
            OutputFormat::Table => Ok(self.problem_card(problem, style)),
            OutputFormat::Quiet => Ok(problem.id.to_string()),
        }
    }

    /// Format the live list, most recent first.
    pub fn format_live<'a, I>(&self, problems: I) -> Result<String>
    where
        I: IntoIterator<Item = &'a Problem>,
    {
        let problems: Vec<&Problem> = problems.into_iter().collect();
        self.format_list(&problems, TimeStyle::TimeOfDay, NO_LIVE_UPDATES)
    }

    /// Format the history list in the order given.
    pub fn format_history(&self, problems: &[Problem]) -> Result<String> {
        let problems: Vec<&Problem> = problems.iter().collect();
        self.format_list(&problems, TimeStyle::DateTime, NO_HISTORY)
    }

    fn format_list(&self, problems: &[&Problem], style: TimeStyle, empty: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(problems)?),
            OutputFormat::Quiet => Ok(problems
                .iter()
                .map(|p| p.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if problems.is_empty() {
                    return Ok(self.colorize(empty, "yellow"));
                }
                let cards: Vec<String> = problems
                    .iter()
                    .map(|p| self.problem_card(p, style))
                    .collect();
                Ok(cards.join("\n\n"))
            }
        }
    }

    /// Card for one record: summary line, outcome table for quantum
    /// records, CID, time.
    fn problem_card(&self, problem: &Problem, style: TimeStyle) -> String {
        let mut lines = vec![self.summary_line(problem)];
        if let Solution::Quantum(dist) = &problem.solution {
            lines.push(distribution_table(dist));
        }
        let cid = format!("CID: {}", problem.cid.as_deref().unwrap_or("-"));
        lines.push(self.colorize(&cid, "cyan"));
        lines.push(self.colorize(&format_timestamp_in(&problem.timestamp, &Local, style), "magenta"));
        lines.join("\n")
    }

    /// Format search results.
    pub fn format_search(&self, results: &SearchResults) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
            OutputFormat::Quiet => Ok(results
                .hits()
                .iter()
                .map(|h| h.question.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let hits = match results {
                    SearchResults::Empty { message } => return Ok(self.colorize(message, "yellow")),
                    SearchResults::Hits(hits) if hits.is_empty() => {
                        return Ok(self.colorize("No similar questions found.", "yellow"))
                    }
                    SearchResults::Hits(hits) => hits,
                };

                let mut builder = Builder::default();
                builder.push_record(["Similarity", "Method", "Question", "Answer", "CID"]);
                for hit in hits {
                    builder.push_record([
                        format!("{:.3}", hit.similarity),
                        hit.method.label().to_string(),
                        hit.question.clone(),
                        hit.answer.clone(),
                        hit.cid.clone().unwrap_or_default(),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format the health check reply.
    pub fn format_status(&self, service_url: &str, status: &ServiceStatus) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(status)?),
            OutputFormat::Quiet => Ok(status.message.clone()),
            OutputFormat::Table => Ok(self.success(&format!("{}: {}", service_url, status.message))),
        }
    }

    /// Format the error banner.
    pub fn banner(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}  (/dismiss to clear)", message), "red")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn method_tag(&self, method: Method) -> String {
        let tag = format!("[{}]", method.label());
        match method {
            Method::Quantum => self.colorize(&tag, "magenta"),
            Method::Ai => self.colorize(&tag, "cyan"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Outcome table of a quantum run.
fn distribution_table(dist: &Distribution) -> String {
    if dist.is_empty() {
        return "(no outcomes)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Outcome", "Value", "Share"]);
    for (label, value) in dist.iter() {
        let share = dist
            .share(label)
            .map(|s| format!("{:.1}%", s * 100.0))
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([label.to_string(), value.to_string(), share]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Render `timestamp` in `tz`; unparseable values are shown as received.
pub fn format_timestamp_in<Tz>(timestamp: &Timestamp, tz: &Tz, style: TimeStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match timestamp.to_utc() {
        Some(utc) => utc.with_timezone(tz).format(style.pattern()).to_string(),
        None => timestamp.as_str().to_string(),
    }
}
