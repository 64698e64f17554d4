//! Persisters: sinks for finished audit events
//!
//! The [`Persister`] trait is the boundary between event construction and
//! storage. Failures are returned to the caller as-is; nothing here retries.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{AuditError, AuditResult};

use super::event::AuditEvent;

/// Sink that takes ownership of finished audit events
pub trait Persister: Send + Sync {
    /// Store or transmit a single event
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()>;

    /// Store the events of one transaction
    ///
    /// Defaults to one `log_audit` call per event, stopping at the first
    /// failure.
    fn log_batch(&self, events: Vec<AuditEvent>) -> AuditResult<()> {
        for event in events {
            self.log_audit(event)?;
        }
        Ok(())
    }
}

impl<P: Persister + ?Sized> Persister for &P {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        (**self).log_audit(event)
    }

    fn log_batch(&self, events: Vec<AuditEvent>) -> AuditResult<()> {
        (**self).log_batch(events)
    }
}

impl<P: Persister + ?Sized> Persister for Box<P> {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        (**self).log_audit(event)
    }

    fn log_batch(&self, events: Vec<AuditEvent>) -> AuditResult<()> {
        (**self).log_batch(events)
    }
}

impl<P: Persister + ?Sized> Persister for Arc<P> {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        (**self).log_audit(event)
    }

    fn log_batch(&self, events: Vec<AuditEvent>) -> AuditResult<()> {
        (**self).log_batch(events)
    }
}

/// Append-only audit log file
///
/// The log uses a line-delimited JSON format (JSONL) where each line is the
/// projection of one audit event.
#[derive(Debug, Clone)]
pub struct JsonlPersister {
    log_path: PathBuf,
}

impl JsonlPersister {
    /// Create a persister that appends to the specified path
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    fn open_for_append(&self) -> AuditResult<File> {
        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuditError::Persistence(format!("Failed to create audit log directory: {}", e))
                })?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| AuditError::Persistence(format!("Failed to open audit log: {}", e)))
    }

    fn write_line<W: Write>(writer: &mut W, event: &AuditEvent) -> AuditResult<()> {
        let json = serde_json::to_string(event).map_err(|e| {
            AuditError::Persistence(format!("Failed to serialize audit event: {}", e))
        })?;

        writeln!(writer, "{}", json)
            .map_err(|e| AuditError::Persistence(format!("Failed to write audit event: {}", e)))
    }

    /// Read all audit events from the log file
    ///
    /// Returns events in the order they were written (oldest first).
    pub fn read_all(&self) -> AuditResult<Vec<AuditEvent>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| AuditError::Persistence(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AuditError::Persistence(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let event: AuditEvent = serde_json::from_str(&line).map_err(|e| {
                AuditError::Persistence(format!(
                    "Failed to parse audit event at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            events.push(event);
        }

        Ok(events)
    }

    /// Read the most recent N events from the log
    pub fn read_recent(&self, count: usize) -> AuditResult<Vec<AuditEvent>> {
        let mut events = self.read_all()?;
        let start = events.len().saturating_sub(count);
        Ok(events.split_off(start))
    }

    /// Number of non-empty lines in the log
    pub fn entry_count(&self) -> AuditResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| AuditError::Persistence(format!("Failed to open audit log: {}", e)))?;

        let count = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }

    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl Persister for JsonlPersister {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        let mut file = self.open_for_append()?;
        Self::write_line(&mut file, &event)?;

        file.flush()
            .map_err(|e| AuditError::Persistence(format!("Failed to flush audit log: {}", e)))
    }

    /// Writes every event, then flushes once
    fn log_batch(&self, events: Vec<AuditEvent>) -> AuditResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut writer = BufWriter::new(self.open_for_append()?);
        for event in &events {
            Self::write_line(&mut writer, event)?;
        }

        writer
            .flush()
            .map_err(|e| AuditError::Persistence(format!("Failed to flush audit log: {}", e)))
    }
}

/// In-memory sink, mainly for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemoryPersister {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every event received so far
    pub fn take(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Persister for MemoryPersister {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}

/// Emits each event as a structured `tracing` record
///
/// Fields go out under the `audit` target at INFO level; the subscriber
/// decides where they end up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPersister;

impl Persister for TracingPersister {
    fn log_audit(&self, event: AuditEvent) -> AuditResult<()> {
        let changed = serde_json::to_string(event.changed()).map_err(|e| {
            AuditError::Persistence(format!("Failed to serialize changed fields: {}", e))
        })?;
        let original = serde_json::to_string(event.original()).map_err(|e| {
            AuditError::Persistence(format!("Failed to serialize original fields: {}", e))
        })?;
        let meta = serde_json::to_string(event.meta()).map_err(|e| {
            AuditError::Persistence(format!("Failed to serialize event metadata: {}", e))
        })?;

        tracing::info!(
            target: "audit",
            event_type = event.event_type().as_str(),
            transaction = %event.transaction_id(),
            source = %event.source_name(),
            parent_source = event.parent_source_name().map(|s| s.as_str()),
            primary_key = %event.id(),
            display_value = event.display_value(),
            changed = %changed,
            original = %original,
            meta = %meta,
            timestamp = %event.timestamp().to_rfc3339(),
            "audit event"
        );

        Ok(())
    }
}
