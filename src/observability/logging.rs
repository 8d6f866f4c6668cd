//! Structured logging in the Cloud Logging format.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Format every log event as one line-delimited JSON record
//! - Attach trace correlation fields from the ambient request context
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - The fully-qualified trace path is only emitted when a project id is
//!   configured; a bare trace id is never written
//! - Non-`message` event fields become per-call labels, serialized as a
//!   JSON-encoded string under `logging.googleapis.com/labels`

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde_json::{json, Map, Value};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Settings;
use crate::observability::propagation;
use crate::observability::trace::TraceContext;

const TRACE_KEY: &str = "logging.googleapis.com/trace";
const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
const SAMPLED_KEY: &str = "logging.googleapis.com/trace_sampled";
const LABELS_KEY: &str = "logging.googleapis.com/labels";

/// Cloud Logging severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        if level == Level::ERROR {
            Severity::Error
        } else if level == Level::WARN {
            Severity::Warning
        } else if level == Level::INFO {
            Severity::Info
        } else {
            // TRACE and DEBUG both map to DEBUG
            Severity::Debug
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Production uses the Cloud Logging JSON event format; development keeps
/// the human-readable default. `RUST_LOG` overrides the filter.
pub fn init(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "books_api=debug,tower_http=info".into());

    if settings.is_development() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(CloudLogFormat::new(settings.project.clone())),
            )
            .init();
    }
}

/// Event formatter producing one Cloud Logging JSON object per event.
pub struct CloudLogFormat {
    project: Option<String>,
}

impl CloudLogFormat {
    pub fn new(project: Option<String>) -> Self {
        Self { project }
    }
}

impl<S, N> FormatEvent<S, N> for CloudLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let record = render(
            Severity::from(*event.metadata().level()),
            &fields.message.unwrap_or_default(),
            &fields.labels,
            &propagation::current(),
            self.project.as_deref(),
        );
        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Build the log record for one event.
///
/// Trace fields are taken from `ctx`: the trace path requires both a
/// trace id and a configured project, the span id is emitted on its own,
/// and the sampling flag only appears when some header parse actually
/// determined it.
pub fn render(
    severity: Severity,
    message: &str,
    labels: &BTreeMap<String, String>,
    ctx: &TraceContext,
    project: Option<&str>,
) -> Value {
    let mut record = Map::new();
    record.insert("severity".into(), json!(severity.as_str()));
    record.insert("message".into(), json!(message));

    if let (Some(trace_id), Some(project)) = (&ctx.trace_id, project) {
        record.insert(
            TRACE_KEY.into(),
            json!(format!("projects/{project}/traces/{trace_id}")),
        );
    }
    if let Some(span_id) = &ctx.span_id {
        record.insert(SPAN_ID_KEY.into(), json!(span_id));
    }
    if let Some(sampled) = ctx.sampled {
        record.insert(SAMPLED_KEY.into(), json!(sampled));
    }
    if !labels.is_empty() {
        let encoded = serde_json::to_string(labels).unwrap_or_default();
        record.insert(LABELS_KEY.into(), json!(encoded));
    }

    Value::Object(record)
}

/// Visitor splitting an event into its message and per-call labels.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    labels: BTreeMap<String, String>,
}

impl EventFields {
    fn set(&mut self, name: &str, value: String) {
        if name == "message" {
            self.message = Some(value);
        } else {
            self.labels.insert(name.to_string(), value);
        }
    }
}

impl tracing::field::Visit for EventFields {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.set(field.name(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.set(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.set(field.name(), value.to_string());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.set(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        // Debug-formatted strings carry quotes; labels should not.
        self.set(field.name(), rendered.trim_matches('"').to_string());
    }
}
