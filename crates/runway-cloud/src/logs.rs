//! Log entries and the follow-mode polling task.
//!
//! Cloud Logging has no push subscription we can use from the CLI, so
//! `runway logs --follow` polls: every [`FOLLOW_INTERVAL`] it fetches entries
//! newer than the watermark (timestamp of the newest entry seen so far) and
//! advances the watermark strictly forward. Cancellation is cooperative and
//! checked before each poll; a fetch already in flight runs to completion.

use crate::gateway::{GatewayError, PlatformGateway, Target};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const FOLLOW_INTERVAL: Duration = Duration::from_secs(2);

/// Entries fetched by a one-shot `runway logs`.
pub const DEFAULT_LOG_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Map a Cloud Logging severity name onto the five levels runway shows.
    pub fn from_cloud_logging(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" | "ALERT" | "EMERGENCY" => Self::Critical,
            // DEFAULT, INFO, NOTICE, and anything unknown
            _ => Self::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub service: String,
    /// Only entries strictly newer than this.
    pub since: Option<DateTime<Utc>>,
    pub limit: u32,
}

// ── gcloud logging read --format json ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEntry {
    timestamp: Option<DateTime<Utc>>,
    receive_timestamp: Option<DateTime<Utc>>,
    severity: Option<String>,
    text_payload: Option<String>,
    json_payload: Option<serde_json::Value>,
    http_request: Option<RawHttpRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHttpRequest {
    request_method: Option<String>,
    request_url: Option<String>,
    status: Option<u16>,
    latency: Option<String>,
}

/// Parse `gcloud logging read --format json` output, oldest first.
/// Entries without any timestamp are dropped.
pub(crate) fn parse_entries(raw: &str) -> Result<Vec<LogEntry>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw_entries: Vec<RawLogEntry> = serde_json::from_str(raw)?;
    let mut entries: Vec<LogEntry> = raw_entries
        .into_iter()
        .filter_map(|raw| {
            let timestamp = raw.timestamp.or(raw.receive_timestamp)?;
            Some(LogEntry {
                timestamp,
                severity: raw
                    .severity
                    .as_deref()
                    .map(Severity::from_cloud_logging)
                    .unwrap_or(Severity::Info),
                message: message_of(&raw),
            })
        })
        .collect();

    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

fn message_of(raw: &RawLogEntry) -> String {
    if let Some(text) = &raw.text_payload {
        return text.trim_end().to_owned();
    }

    if let Some(payload) = &raw.json_payload {
        if let Some(message) = payload.get("message").and_then(|m| m.as_str()) {
            return message.trim_end().to_owned();
        }
    }

    if let Some(http) = &raw.http_request {
        let mut parts = Vec::new();
        if let Some(method) = &http.request_method {
            parts.push(method.clone());
        }
        if let Some(url) = &http.request_url {
            parts.push(url.clone());
        }
        if let Some(status) = http.status {
            parts.push(status.to_string());
        }
        if let Some(latency) = &http.latency {
            parts.push(latency.clone());
        }
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }

    raw.json_payload
        .as_ref()
        .map(|payload| payload.to_string())
        .unwrap_or_default()
}

/// Cancellable polling task behind `runway logs --follow`.
pub struct LogStream {
    cancel: CancellationToken,
    interval: Duration,
    limit: u32,
    watermark: DateTime<Utc>,
}

impl LogStream {
    /// Stream entries strictly newer than `since`.
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            interval: FOLLOW_INTERVAL,
            limit: DEFAULT_LOG_LIMIT,
            watermark: since,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop on an externally owned token, e.g. one cancelled by Ctrl-C.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Handle that stops the stream; cancelling it is the only way
    /// [`run`](Self::run) returns `Ok`.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Poll until cancelled, handing each new entry to `on_entry` in order.
    ///
    /// A failed fetch ends the stream with that error.
    pub async fn run<G, F>(
        &mut self,
        gateway: &G,
        target: &Target,
        service: &str,
        mut on_entry: F,
    ) -> Result<(), GatewayError>
    where
        G: PlatformGateway,
        F: FnMut(LogEntry),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let floor = self.watermark;
            let query = LogQuery {
                service: service.to_owned(),
                since: Some(floor),
                limit: self.limit,
            };
            let entries = gateway.fetch_logs(target, &query).await?;

            for entry in entries.into_iter().filter(|e| e.timestamp > floor) {
                if entry.timestamp > self.watermark {
                    self.watermark = entry.timestamp;
                }
                on_entry(entry);
            }
        }

        tracing::debug!(watermark = %self.watermark, "log stream cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_mapping() {
        assert_eq!(Severity::from_cloud_logging("DEFAULT"), Severity::Info);
        assert_eq!(Severity::from_cloud_logging("NOTICE"), Severity::Info);
        assert_eq!(Severity::from_cloud_logging("warning"), Severity::Warning);
        assert_eq!(Severity::from_cloud_logging("ALERT"), Severity::Critical);
        assert_eq!(Severity::from_cloud_logging("EMERGENCY"), Severity::Critical);
        assert_eq!(Severity::from_cloud_logging("DEBUG"), Severity::Debug);
    }

    #[test]
    fn parse_entries_orders_oldest_first() {
        let raw = r#"[
            {"timestamp": "2025-01-01T00:00:02Z", "severity": "ERROR", "textPayload": "second\n"},
            {"timestamp": "2025-01-01T00:00:01Z", "severity": "INFO", "jsonPayload": {"message": "first"}}
        ]"#;

        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
        assert_eq!(entries[1].severity, Severity::Error);
    }

    #[test]
    fn parse_entries_http_request_summary() {
        let raw = r#"[{
            "timestamp": "2025-01-01T00:00:00Z",
            "httpRequest": {"requestMethod": "GET", "requestUrl": "https://app/health", "status": 200, "latency": "0.002s"}
        }]"#;

        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries[0].message, "GET https://app/health 200 0.002s");
        assert_eq!(entries[0].severity, Severity::Info);
    }

    #[test]
    fn parse_entries_falls_back_to_receive_timestamp() {
        let raw = r#"[
            {"receiveTimestamp": "2025-01-01T00:00:00Z", "textPayload": "kept"},
            {"textPayload": "dropped"}
        ]"#;

        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn parse_entries_json_payload_without_message() {
        let raw = r#"[{"timestamp": "2025-01-01T00:00:00Z", "jsonPayload": {"k": 1}}]"#;
        assert_eq!(parse_entries(raw).unwrap()[0].message, r#"{"k":1}"#);
    }

    #[test]
    fn parse_entries_empty_output() {
        assert!(parse_entries("").unwrap().is_empty());
        assert!(parse_entries("[]").unwrap().is_empty());
    }
}
