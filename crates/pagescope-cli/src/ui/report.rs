//! Report rendering: console transcript, network ledger and health summary.

use super::format::{format_age, format_status};
use super::paint;
use owo_colors::Style;
use pagescope_core::diagnostics::{PendingSummary, ResourceCategory};
use pagescope_core::format::{format_body, format_headers};
use pagescope_core::{
    ConsoleClass, DiagnosticsReport, LedgerAnomaly, NetworkExchange, Outcome, Session,
    SummaryPolicy, TranscriptEntry,
};
use serde::Serialize;

/// Knobs for the text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Truncation bound for header values and bodies
    pub max_value_len: usize,
    /// Print request and response headers under each exchange
    pub show_headers: bool,
    /// Print request bodies under each exchange
    pub show_bodies: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_value_len: pagescope_core::DEFAULT_MAX_LEN,
            show_headers: false,
            show_bodies: false,
        }
    }
}

/// Everything a window produced, as one JSON document.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Console transcript in arrival order
    pub console: Vec<TranscriptEntry>,
    /// Network exchanges in creation order
    pub network: Vec<NetworkExchange>,
    /// Correlation anomalies noted along the way
    pub anomalies: &'a [LedgerAnomaly],
    /// Health summary
    pub summary: DiagnosticsReport,
}

impl<'a> JsonReport<'a> {
    /// Snapshots `session` and summarizes it under `policy`.
    pub fn from_session(session: &'a Session, policy: &SummaryPolicy) -> Self {
        Self {
            console: session.console_snapshot(),
            network: session.network_snapshot(),
            anomalies: session.anomalies(),
            summary: session.summarize(policy),
        }
    }
}

/// Renders the report as pretty JSON.
///
/// # Errors
///
/// Fails only if a captured value cannot be serialized.
pub fn render_json(session: &Session, policy: &SummaryPolicy) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::from_session(session, policy))
}

/// Renders the full text report.
pub fn render_text(session: &Session, policy: &SummaryPolicy, options: &RenderOptions) -> String {
    let mut lines = Vec::new();

    render_transcript(&session.console_snapshot(), &mut lines);
    lines.push(String::new());
    render_network(&session.network_snapshot(), policy, options, &mut lines);
    if !session.anomalies().is_empty() {
        lines.push(String::new());
        render_anomalies(session.anomalies(), &mut lines);
    }
    lines.push(String::new());
    render_summary(&session.summarize(policy), &mut lines);

    lines.join("\n")
}

/// One line for an exchange: method, URL, status and timing.
///
/// Failures and statuses at or above the policy's failure threshold are red,
/// pending exchanges yellow.
pub fn network_line(exchange: &NetworkExchange, policy: &SummaryPolicy) -> String {
    let status = format_status(&exchange.outcome);
    let (status, timing) = match &exchange.outcome {
        Outcome::Pending => (paint(status, Style::new().yellow()), String::new()),
        Outcome::Failed { .. } => (paint(status, Style::new().red()), String::new()),
        Outcome::Completed { status: code, duration_ms, .. } => {
            let failing = code.code().is_some_and(|c| c >= policy.failure_status_min);
            let style = if failing { Style::new().red() } else { Style::new().green() };
            (paint(status, style), format!(" {}", paint(format_age(*duration_ms), Style::new().dimmed())))
        }
    };

    format!("{} {} {}{}", paint(&exchange.method, Style::new().bold()), exchange.url, status, timing)
}

fn class_style(class: ConsoleClass) -> Style {
    match class {
        ConsoleClass::Alert => Style::new().red(),
        ConsoleClass::Caution => Style::new().yellow(),
        ConsoleClass::Normal => Style::new(),
    }
}

fn render_transcript(entries: &[TranscriptEntry], lines: &mut Vec<String>) {
    lines.push(heading(&format!("Console ({})", entries.len())));
    if entries.is_empty() {
        lines.push(paint("  (no console output)", Style::new().dimmed()));
        return;
    }

    for entry in entries {
        let label = match entry {
            TranscriptEntry::Console(record) => record.severity.as_str().to_string(),
            TranscriptEntry::PageError(_) => "pageerror".to_string(),
        };
        let line = format!("[{label}] {}", entry.text());
        lines.push(format!("  {}", paint(line, class_style(entry.class()))));
    }
}

fn render_network(
    exchanges: &[NetworkExchange],
    policy: &SummaryPolicy,
    options: &RenderOptions,
    lines: &mut Vec<String>,
) {
    lines.push(heading(&format!("Network ({})", exchanges.len())));
    if exchanges.is_empty() {
        lines.push(paint("  (no requests)", Style::new().dimmed()));
        return;
    }

    for exchange in exchanges {
        lines.push(format!("  {}", network_line(exchange, policy)));

        if options.show_headers {
            for (name, value) in format_headers(&exchange.request.headers, options.max_value_len) {
                lines.push(paint(format!("      > {name}: {value}"), Style::new().dimmed()));
            }
            if let Outcome::Completed { headers, .. } = &exchange.outcome {
                for (name, value) in format_headers(headers, options.max_value_len) {
                    lines.push(paint(format!("      < {name}: {value}"), Style::new().dimmed()));
                }
            }
        }

        if options.show_bodies {
            if let Some(body) = &exchange.request.body {
                lines.push(format!("      body: {}", format_body(body, options.max_value_len)));
            }
        }
    }
}

fn render_anomalies(anomalies: &[LedgerAnomaly], lines: &mut Vec<String>) {
    lines.push(heading(&format!("Anomalies ({})", anomalies.len())));
    for anomaly in anomalies {
        let text = match anomaly {
            LedgerAnomaly::UnmatchedResponse { url, method, status } => {
                format!("response {status} for {method} {url} had no pending request")
            }
            LedgerAnomaly::SynthesizedFailure { id, url, reason } => {
                format!("failure {reason} for {url} had no pending request, recorded as {id}")
            }
            LedgerAnomaly::UnknownExchange { id } => format!("unknown exchange {id}"),
            LedgerAnomaly::UnknownSocket { handle, id: Some(id) } => {
                format!("error for websocket {handle} that was never opened, recorded as {id}")
            }
            LedgerAnomaly::UnknownSocket { handle, id: None } => {
                format!("close for websocket {handle} that was never opened")
            }
            LedgerAnomaly::AlreadyTerminal { id } => format!("{id} already had an outcome"),
        };
        lines.push(paint(format!("  {text}"), Style::new().dimmed()));
    }
}

fn category_label(category: ResourceCategory) -> (&'static str, Option<&'static str>) {
    match category {
        ResourceCategory::Script => ("scripts", Some("functionality is likely broken")),
        ResourceCategory::Stylesheet => ("stylesheets", Some("layout is likely broken")),
        ResourceCategory::Image => ("images", Some("imagery is likely broken")),
        ResourceCategory::Other => ("other", None),
    }
}

fn pending_line(item: &PendingSummary) -> String {
    format!("    {} {} ({})", item.method, item.url, format_age(item.age_ms))
}

fn render_summary(report: &DiagnosticsReport, lines: &mut Vec<String>) {
    let counts = &report.counts;
    lines.push(heading("Summary"));
    lines.push(format!(
        "  {} requests: {} successful ({} clean), {} failed, {} pending",
        report.total(),
        paint(counts.successful, Style::new().green()),
        counts.clean,
        paint(counts.failed, if counts.failed > 0 { Style::new().red() } else { Style::new() }),
        paint(counts.pending, if counts.pending > 0 { Style::new().yellow() } else { Style::new() }),
    ));

    for (category, items) in report.pending_by_category.non_empty() {
        let (name, symptom) = category_label(category);
        let header = match symptom {
            Some(symptom) => format!("  Pending {name} ({}): {symptom}", items.len()),
            None => format!("  Pending {name} ({})", items.len()),
        };
        lines.push(paint(header, Style::new().yellow()));
        lines.extend(items.iter().map(pending_line));
    }

    if !report.stuck.is_empty() {
        lines.push(paint(
            format!(
                "  Stuck for more than {} ({})",
                format_age(report.stale_threshold_ms),
                report.stuck.len()
            ),
            Style::new().red(),
        ));
        lines.extend(report.stuck.iter().map(pending_line));
    }

    if report.is_multi_host_stall() {
        lines.push(paint(
            format!(
                "  ⚠ Pending requests span {} hosts: {}",
                report.pending_hosts.len(),
                report.pending_hosts.join(", ")
            ),
            Style::new().yellow().bold(),
        ));
    }

    if report.is_healthy() {
        lines.push(paint("  ✓ No failed or stuck requests", Style::new().green()));
    }
}

fn heading(text: &str) -> String {
    paint(text, Style::new().bold().underline())
}
