//! Record command
//!
//! Reads lifecycle notifications as JSON lines and delivers the resulting
//! audit events.

use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use crate::audit::{
    AuditTracker, Delivery, JsonlPersister, LifecycleHooks, LifecycleNotification, Persister,
    TracingPersister, TransactionId,
};
use crate::config::{AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};

/// Where recorded events go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Sink {
    /// Append to the audit log file
    #[default]
    File,
    /// Emit as structured log records on stderr
    Trace,
}

/// Arguments for `record`
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// File of JSON-line notifications (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Deliver each transaction's events together once all input is read
    #[arg(short, long)]
    pub batch: bool,

    /// Destination for the events
    #[arg(long, value_enum, default_value = "file")]
    pub sink: Sink,
}

/// Counts from one `record` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordSummary {
    pub notifications: usize,
    pub logged: usize,
    pub skipped: usize,
}

/// Handle the record command
pub fn handle_record_command(
    paths: &AuditPaths,
    settings: &Settings,
    args: RecordArgs,
) -> AuditResult<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            AuditError::Io(format!("Failed to open {}: {}", path.display(), e))
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = match args.sink {
        Sink::File => {
            let persister = JsonlPersister::new(settings.audit_log_path(paths));
            let tracker = AuditTracker::from_settings(settings, persister)?;
            record_notifications(&tracker, reader, args.batch)?
        }
        Sink::Trace => {
            let tracker = AuditTracker::from_settings(settings, TracingPersister)?;
            record_notifications(&tracker, reader, args.batch)?
        }
    };

    println!(
        "Recorded {} event(s) from {} notification(s) ({} with nothing to audit)",
        summary.logged, summary.notifications, summary.skipped
    );

    Ok(())
}

/// Deliver every notification read from `reader`
///
/// Blank lines are ignored. In batch mode events are grouped by transaction
/// id, in order of first appearance, and each group is committed in one
/// persister call.
pub fn record_notifications<P, R>(
    tracker: &AuditTracker<P>,
    reader: R,
    batch: bool,
) -> AuditResult<RecordSummary>
where
    P: Persister,
    R: BufRead,
{
    let notifications = parse_notifications(reader)?;
    let mut summary = RecordSummary {
        notifications: notifications.len(),
        ..RecordSummary::default()
    };

    if !batch {
        for notification in &notifications {
            match tracker.handle(notification)? {
                Delivery::Logged(_) => summary.logged += 1,
                Delivery::NothingToAudit => summary.skipped += 1,
            }
        }
        return Ok(summary);
    }

    let mut groups: Vec<(TransactionId, Vec<&LifecycleNotification>)> = Vec::new();
    for notification in &notifications {
        let transaction = &notification.context().transaction_id;
        match groups.iter().position(|(id, _)| id == transaction) {
            Some(index) => groups[index].1.push(notification),
            None => groups.push((transaction.clone(), vec![notification])),
        }
    }

    for (transaction, group) in groups {
        let mut audit_batch = tracker.begin_with(transaction);
        for notification in group {
            if audit_batch.stage(notification)?.is_none() {
                summary.skipped += 1;
            }
        }
        summary.logged += audit_batch.commit()?;
    }

    Ok(summary)
}

fn parse_notifications<R: BufRead>(reader: R) -> AuditResult<Vec<LifecycleNotification>> {
    let mut notifications = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            AuditError::Io(format!("Failed to read input line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let notification: LifecycleNotification = serde_json::from_str(&line).map_err(|e| {
            AuditError::Json(format!(
                "Invalid notification at line {}: {}",
                line_num + 1,
                e
            ))
        })?;
        notifications.push(notification);
    }

    Ok(notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEventFactory, FieldPolicy, MemoryPersister, SourceName};

    const INPUT: &str = r#"
{"kind":"create","transaction":"t1","primary_key":1,"source":"articles","fields":{"id":1,"title":"A","author_id":3}}
{"kind":"update","transaction":"t2","primary_key":1,"source":"articles","original":{"id":1,"author_id":3},"current":{"id":1,"author_id":4}}
{"kind":"update","transaction":"t1","primary_key":1,"source":"articles","original":{"id":1,"title":"A"},"current":{"id":1,"title":"B"}}

{"kind":"delete","transaction":"t2","primary_key":2,"source":"comments","fields":{"id":2,"body":"x"}}
"#;

    fn tracker() -> AuditTracker<MemoryPersister> {
        AuditTracker::new(MemoryPersister::new()).track(
            SourceName::new("articles").unwrap(),
            AuditEventFactory::new(FieldPolicy::whitelist_only(["id", "title"]).unwrap()),
        )
    }

    #[test]
    fn test_record_one_by_one() {
        let tracker = tracker();
        let summary = record_notifications(&tracker, INPUT.as_bytes(), false).unwrap();

        assert_eq!(
            summary,
            RecordSummary {
                notifications: 4,
                logged: 3,
                skipped: 1,
            }
        );
        let sources: Vec<String> = tracker
            .persister()
            .events()
            .iter()
            .map(|e| e.source_name().to_string())
            .collect();
        assert_eq!(sources, vec!["articles", "articles", "comments"]);
    }

    #[test]
    fn test_record_in_batches_groups_by_transaction() {
        let tracker = tracker();
        let summary = record_notifications(&tracker, INPUT.as_bytes(), true).unwrap();

        assert_eq!(summary.logged, 3);
        assert_eq!(summary.skipped, 1);

        let transactions: Vec<String> = tracker
            .persister()
            .events()
            .iter()
            .map(|e| e.transaction_id().to_string())
            .collect();
        assert_eq!(transactions, vec!["t1", "t1", "t2"]);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let tracker = tracker();
        let input = "{\"kind\":\"create\"}\n";

        let err = record_notifications(&tracker, input.as_bytes(), false).unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(tracker.persister().is_empty());
    }
}
