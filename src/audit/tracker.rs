//! Lifecycle hooks
//!
//! The host calls one hook per saved or deleted record. The tracker picks
//! the factory configured for the record's source, builds the event and
//! hands it to the persister.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::event::{AuditEvent, EventType};
use super::factory::AuditEventFactory;
use super::persister::Persister;
use super::record::{FieldMap, RecordContext, RecordId, SourceName, TransactionId};
use crate::config::Settings;
use crate::error::{AuditError, AuditResult};

/// A record lifecycle notification from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LifecycleNotification {
    /// A new record was saved
    Create {
        #[serde(flatten)]
        context: RecordContext,
        fields: FieldMap,
    },
    /// An existing record was saved
    Update {
        #[serde(flatten)]
        context: RecordContext,
        original: FieldMap,
        current: FieldMap,
    },
    /// A record was deleted
    Delete {
        #[serde(flatten)]
        context: RecordContext,
        fields: FieldMap,
    },
}

impl LifecycleNotification {
    pub fn context(&self) -> &RecordContext {
        match self {
            Self::Create { context, .. }
            | Self::Update { context, .. }
            | Self::Delete { context, .. } => context,
        }
    }

    /// The event type this notification can produce
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Create { .. } => EventType::Create,
            Self::Update { .. } => EventType::Update,
            Self::Delete { .. } => EventType::Delete,
        }
    }
}

/// Outcome of a lifecycle hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// An event was built and accepted by the persister
    Logged(EventType),
    /// The save touched no tracked field
    NothingToAudit,
}

impl Delivery {
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::Logged(_))
    }
}

/// Hooks the host calls after a record is created, updated or deleted
pub trait LifecycleHooks {
    fn on_create(&self, context: &RecordContext, fields: &FieldMap) -> AuditResult<Delivery>;

    fn on_update(
        &self,
        context: &RecordContext,
        original: &FieldMap,
        current: &FieldMap,
    ) -> AuditResult<Delivery>;

    fn on_delete(&self, context: &RecordContext, fields: &FieldMap) -> AuditResult<Delivery>;

    /// Dispatch a notification to the matching hook
    fn handle(&self, notification: &LifecycleNotification) -> AuditResult<Delivery> {
        match notification {
            LifecycleNotification::Create { context, fields } => self.on_create(context, fields),
            LifecycleNotification::Update {
                context,
                original,
                current,
            } => self.on_update(context, original, current),
            LifecycleNotification::Delete { context, fields } => self.on_delete(context, fields),
        }
    }
}

/// Routes lifecycle notifications to per-source factories and a persister
///
/// Sources without their own factory use the default one.
pub struct AuditTracker<P> {
    persister: P,
    default_factory: Arc<AuditEventFactory>,
    sources: HashMap<SourceName, Arc<AuditEventFactory>>,
}

impl<P: Persister> AuditTracker<P> {
    /// Create a tracker that applies the default field policy to every source
    pub fn new(persister: P) -> Self {
        Self {
            persister,
            default_factory: Arc::new(AuditEventFactory::default()),
            sources: HashMap::new(),
        }
    }

    /// Build a tracker from loaded settings
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Config` if any source's policy is invalid.
    pub fn from_settings(settings: &Settings, persister: P) -> AuditResult<Self> {
        let mut tracker = Self::new(persister).with_default(settings.default_factory()?);

        for (name, source) in &settings.sources {
            let source_name = SourceName::new(name.as_str())
                .map_err(|_| AuditError::Config("source name must not be empty".into()))?;
            let factory = source.to_factory()?.with_meta(settings.meta.clone());
            tracker.sources.insert(source_name, Arc::new(factory));
        }

        Ok(tracker)
    }

    /// Replace the factory used for sources without their own
    pub fn with_default(mut self, factory: AuditEventFactory) -> Self {
        self.default_factory = Arc::new(factory);
        self
    }

    /// Configure a factory for one source
    pub fn track(mut self, source: SourceName, factory: AuditEventFactory) -> Self {
        self.sources.insert(source, Arc::new(factory));
        self
    }

    pub fn is_tracked(&self, source: &SourceName) -> bool {
        self.sources.contains_key(source)
    }

    /// Iterate the explicitly configured sources
    pub fn sources(&self) -> impl Iterator<Item = &SourceName> {
        self.sources.keys()
    }

    pub fn factory_for(&self, source: &SourceName) -> &AuditEventFactory {
        self.sources.get(source).unwrap_or(&self.default_factory)
    }

    /// Shared handle to a source's factory, for use on other threads
    pub fn shared_factory(&self, source: &SourceName) -> Arc<AuditEventFactory> {
        Arc::clone(self.sources.get(source).unwrap_or(&self.default_factory))
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }

    /// Build the event for a notification without persisting it
    pub fn build(&self, notification: &LifecycleNotification) -> Option<AuditEvent> {
        let factory = self.factory_for(&notification.context().source);

        match notification {
            LifecycleNotification::Create { context, fields } => {
                Some(factory.on_create(context, fields))
            }
            LifecycleNotification::Update {
                context,
                original,
                current,
            } => factory.on_update(context, original, current),
            LifecycleNotification::Delete { context, fields } => {
                Some(factory.on_delete(context, fields))
            }
        }
    }

    /// Open a batch for a new transaction
    pub fn begin(&self) -> AuditBatch<'_, P> {
        self.begin_with(TransactionId::generate())
    }

    /// Open a batch bound to an existing transaction id
    pub fn begin_with(&self, transaction_id: TransactionId) -> AuditBatch<'_, P> {
        AuditBatch {
            tracker: self,
            transaction_id,
            events: Vec::new(),
        }
    }

    fn deliver(&self, context: &RecordContext, event: Option<AuditEvent>) -> AuditResult<Delivery> {
        match event {
            Some(event) => {
                let event_type = event.event_type();
                self.persister.log_audit(event)?;
                Ok(Delivery::Logged(event_type))
            }
            None => {
                debug!(
                    source = %context.source,
                    primary_key = %context.id,
                    "no tracked field changed, nothing to audit"
                );
                Ok(Delivery::NothingToAudit)
            }
        }
    }
}

impl<P: Persister> LifecycleHooks for AuditTracker<P> {
    fn on_create(&self, context: &RecordContext, fields: &FieldMap) -> AuditResult<Delivery> {
        let event = self.factory_for(&context.source).on_create(context, fields);
        self.deliver(context, Some(event))
    }

    fn on_update(
        &self,
        context: &RecordContext,
        original: &FieldMap,
        current: &FieldMap,
    ) -> AuditResult<Delivery> {
        let event = self
            .factory_for(&context.source)
            .on_update(context, original, current);
        self.deliver(context, event)
    }

    fn on_delete(&self, context: &RecordContext, fields: &FieldMap) -> AuditResult<Delivery> {
        let event = self.factory_for(&context.source).on_delete(context, fields);
        self.deliver(context, Some(event))
    }
}

/// Events of one transaction, handed to the persister together on commit
///
/// Dropping a batch without committing discards its events.
pub struct AuditBatch<'t, P: Persister> {
    tracker: &'t AuditTracker<P>,
    transaction_id: TransactionId,
    events: Vec<AuditEvent>,
}

impl<'t, P: Persister> AuditBatch<'t, P> {
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Context for a record saved within this transaction
    pub fn context(&self, id: impl Into<RecordId>, source: SourceName) -> RecordContext {
        RecordContext::new(self.transaction_id.clone(), id, source)
    }

    /// Build and queue the event for a notification
    ///
    /// Returns the queued event's type, or `None` if there was nothing to
    /// audit.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Precondition` if the notification belongs to a
    /// different transaction.
    pub fn stage(&mut self, notification: &LifecycleNotification) -> AuditResult<Option<EventType>> {
        let context = notification.context();
        if context.transaction_id != self.transaction_id {
            return Err(AuditError::Precondition(format!(
                "notification for transaction {} staged in batch {}",
                context.transaction_id, self.transaction_id
            )));
        }

        Ok(self.tracker.build(notification).map(|event| {
            let event_type = event.event_type();
            self.events.push(event);
            event_type
        }))
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand every queued event to the persister in one call
    ///
    /// Returns the number of events delivered.
    pub fn commit(mut self) -> AuditResult<usize> {
        let events = std::mem::take(&mut self.events);
        let count = events.len();

        if count > 0 {
            self.tracker.persister.log_batch(events)?;
            tracing::info!(
                transaction = %self.transaction_id,
                events = count,
                "audit batch committed"
            );
        }

        Ok(count)
    }
}

impl<P: Persister> Drop for AuditBatch<'_, P> {
    fn drop(&mut self) {
        if !self.events.is_empty() {
            debug!(
                transaction = %self.transaction_id,
                events = self.events.len(),
                "audit batch discarded without commit"
            );
        }
    }
}
