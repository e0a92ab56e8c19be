use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    generator::GenerateError,
    models::{FieldId, GeneratedRecord, GenerationRequest},
};

pub const COPY_ACK_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Idle,
    Loading { subject: String },
    Success { record: GeneratedRecord, generated_at: DateTime<Utc> },
    ErrorDisplayed { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("subject is required")] EmptySubject,
    #[error("a generation is already in progress")] AlreadyLoading,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CopyRejected {
    #[error("there is no listing to copy from")] NoRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Serializes `record` with 2-space indentation, named after its `baseName`.
pub fn export_record(record: &GeneratedRecord) -> Result<ExportFile, serde_json::Error> {
    Ok(ExportFile {
        file_name: format!("{}.json", sanitize_file_stem(&record.base_name)),
        contents: serde_json::to_string_pretty(record)?,
    })
}

fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() { "record".to_string() } else { stem.to_string() }
}

// Each field expires independently.
#[derive(Debug, Default, Clone)]
pub struct CopyAcks {
    marked: HashMap<FieldId, Instant>,
}

impl CopyAcks {
    pub fn mark(&mut self, field: FieldId, now: Instant) {
        self.marked.insert(field, now);
    }

    pub fn is_active(&self, field: FieldId, now: Instant) -> bool {
        self.marked
            .get(&field)
            .is_some_and(|at| now.saturating_duration_since(*at) < COPY_ACK_WINDOW)
    }

    /// Time until the earliest still-active marker expires.
    pub fn next_expiry(&self, now: Instant) -> Option<Duration> {
        self.marked
            .values()
            .filter_map(|at| (*at + COPY_ACK_WINDOW).checked_duration_since(now))
            .filter(|left| !left.is_zero())
            .min()
    }

    pub fn prune(&mut self, now: Instant) {
        self.marked.retain(|_, at| now.saturating_duration_since(*at) < COPY_ACK_WINDOW);
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

#[derive(Debug)]
pub struct Workbench {
    state: FormState,
    acks: CopyAcks,
    last_subject: String,
}

impl Default for Workbench {
    fn default() -> Self {
        Self { state: FormState::Idle, acks: CopyAcks::default(), last_subject: String::new() }
    }
}

impl Workbench {
    pub fn state(&self) -> &FormState { &self.state }

    pub fn last_subject(&self) -> &str { &self.last_subject }

    pub fn is_loading(&self) -> bool { matches!(self.state, FormState::Loading { .. }) }

    pub fn record(&self) -> Option<&GeneratedRecord> {
        match &self.state {
            FormState::Success { record, .. } => Some(record),
            _ => None,
        }
    }

    // On Ok the caller issues exactly one generation.
    pub fn submit(&mut self, subject: &str) -> Result<GenerationRequest, SubmitRejected> {
        if self.is_loading() {
            return Err(SubmitRejected::AlreadyLoading);
        }
        let request = GenerationRequest::new(subject).ok_or(SubmitRejected::EmptySubject)?;
        self.last_subject = subject.to_string();
        self.state = FormState::Loading { subject: subject.to_string() };
        Ok(request)
    }

    // Ignored unless loading.
    pub fn complete(&mut self, result: Result<GeneratedRecord, GenerateError>, now: DateTime<Utc>) {
        if !self.is_loading() {
            warn!("⚠️ Discarding generation result, form is not loading");
            return;
        }
        self.acks.clear();
        self.state = match result {
            Ok(record) => {
                info!("✅ Listing '{}' ready", record.base_name);
                FormState::Success { record, generated_at: now }
            }
            Err(e) => FormState::ErrorDisplayed { message: e.to_string() },
        };
    }

    pub fn copy(&mut self, field: FieldId, now: Instant) -> Result<String, CopyRejected> {
        let text = self.record().ok_or(CopyRejected::NoRecord)?.field_text(field).to_string();
        self.acks.prune(now);
        self.acks.mark(field, now);
        Ok(text)
    }

    pub fn acks(&self) -> &CopyAcks { &self.acks }

    pub fn export(&self) -> Option<Result<ExportFile, serde_json::Error>> {
        self.record().map(export_record)
    }
}
