//! Audit event core
//!
//! Turns record lifecycle notifications into immutable audit events and
//! hands them to a persister.
//!
//! # Architecture
//!
//! - `filter`: which fields of a record are tracked (whitelist, schema, blacklist)
//! - `diff`: snapshot and update diff of the tracked fields
//! - `event`: the `AuditEvent` data model and its projection
//! - `factory`: builds create/update/delete events for one source
//! - `persister`: the `Persister` sink trait and its JSONL, in-memory and
//!   tracing implementations
//! - `tracker`: lifecycle hooks routing notifications to factories and a persister
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_stash::audit::{
//!     AuditEventFactory, AuditTracker, FieldPolicy, JsonlPersister, LifecycleHooks,
//!     RecordContext, SourceName, TransactionId,
//! };
//!
//! let articles = SourceName::new("articles")?;
//! let policy = FieldPolicy::whitelist_only(["id", "title", "body"])?;
//! let tracker = AuditTracker::new(JsonlPersister::new("audit.log"))
//!     .track(articles.clone(), AuditEventFactory::new(policy));
//!
//! let context = RecordContext::new(TransactionId::generate(), 13i64, articles);
//! tracker.on_update(&context, &before, &after)?;
//! ```

mod diff;
mod event;
mod factory;
mod filter;
mod persister;
mod record;
mod tracker;

pub use diff::{build_diff, build_snapshot, describe_changes_nested, summarize_changes};
pub use event::{AuditEvent, EventType};
pub use factory::AuditEventFactory;
pub use filter::{select_fields, FieldPolicy, TrackedFields, Whitelist, DEFAULT_BLACKLIST};
pub use persister::{JsonlPersister, MemoryPersister, Persister, TracingPersister};
pub use record::{FieldMap, RecordContext, RecordId, SourceName, TransactionId};
pub use tracker::{AuditBatch, AuditTracker, Delivery, LifecycleHooks, LifecycleNotification};
