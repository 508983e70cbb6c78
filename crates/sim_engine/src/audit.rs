//! Append-only audit trail of simulation runs, bounded by a retention limit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;
use uuid::Uuid;

/// Default number of events retained.
pub const DEFAULT_MAX_EVENTS: usize = 100_000;

/// Audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Run accepted
    Start,
    /// Run finished (including cache hits)
    Complete,
    /// Run failed
    Error,
}

/// Sensitivity label stamped on every audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataClassification {
    /// Publishable
    Public,
    /// Internal use only
    #[default]
    Internal,
    /// Need-to-know
    Confidential,
    /// Named individuals only
    Restricted,
}

impl DataClassification {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Confidential => "confidential",
            Self::Restricted => "restricted",
        }
    }
}

impl FromStr for DataClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            "confidential" => Ok(Self::Confidential),
            "restricted" => Ok(Self::Restricted),
            _ => Err(format!("unknown data classification: {}", s)),
        }
    }
}

impl fmt::Display for DataClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event ID
    pub event_id: Uuid,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: AuditEventType,
    /// Run the event belongs to
    pub simulation_id: Uuid,
    /// Free-form details
    pub details: serde_json::Value,
    /// Classification of the run's data
    pub data_classification: DataClassification,
}

/// Bounded, thread-safe audit trail.
///
/// Once `max_events` is reached the oldest event is dropped for every new
/// one. Drops are counted ([`evicted`](Self::evicted)) and the first one is
/// logged at `warn`.
#[derive(Debug)]
pub struct AuditLog {
    events: RwLock<VecDeque<AuditEvent>>,
    max_events: usize,
    evicted: AtomicU64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    /// Create an empty log retaining [`DEFAULT_MAX_EVENTS`].
    pub fn new() -> Self {
        Self::with_max_events(DEFAULT_MAX_EVENTS)
    }

    /// Create an empty log retaining at most `max` events.
    pub fn with_max_events(max: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events: max.max(1),
            evicted: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<AuditEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<AuditEvent>> {
        self.events.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event and return its ID.
    pub fn record(
        &self,
        event_type: AuditEventType,
        simulation_id: Uuid,
        details: serde_json::Value,
        data_classification: DataClassification,
    ) -> Uuid {
        let event = AuditEvent {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            simulation_id,
            details,
            data_classification,
        };
        let event_id = event.event_id;

        let mut events = self.write();
        if events.len() >= self.max_events {
            events.pop_front();
            if self.evicted.fetch_add(1, Ordering::Relaxed) == 0 {
                warn!(
                    max_events = self.max_events,
                    "audit log full; oldest events are now being dropped"
                );
            }
        }
        events.push_back(event);
        event_id
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.read().iter().cloned().collect()
    }

    /// Retained events of one type, oldest first.
    pub fn events_by_type(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Events recorded for one run, oldest first.
    pub fn events_for(&self, simulation_id: Uuid) -> Vec<AuditEvent> {
        self.read()
            .iter()
            .filter(|e| e.simulation_id == simulation_id)
            .cloned()
            .collect()
    }

    /// Number of retained events.
    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Retention limit.
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Events dropped to stay within the limit since the log was created.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Retained events as a JSON array.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let events = self.read();
        serde_json::to_string_pretty(&*events)
    }
}
