/*!
 * Guard Audit Trail
 * Tracks authority decisions and missing bindings for security monitoring
 */

use super::traits::Decision;
use crate::core::limits::{MAX_AUDITED_CONTEXTS, MAX_AUDIT_EVENTS_PER_CONTEXT};
use crate::core::types::ContextId;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::time::SystemTime;

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// Kind of check that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardCheck {
    Attribute,
    Value,
    Binding,
}

/// Guard audit event
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub context: ContextId,
    pub check: GuardCheck,
    pub subject: String,
    pub authority: Option<String>,
    pub allowed: bool,
    pub reason: Option<String>,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn decision(context: ContextId, check: GuardCheck, subject: &str, authority: &str, decision: &Decision) -> Self {
        let allowed = decision.is_allowed();
        let severity = if allowed {
            AuditSeverity::Info
        } else {
            AuditSeverity::Warning
        };

        Self {
            context,
            check,
            subject: subject.to_string(),
            authority: Some(authority.to_string()),
            allowed,
            reason: decision.reason().map(str::to_string),
            severity,
            logged_at: SystemTime::now(),
        }
    }

    /// A guarded operation ran with nothing bound
    pub fn unavailable(context: ContextId) -> Self {
        Self {
            context,
            check: GuardCheck::Binding,
            subject: "authority".to_string(),
            authority: None,
            allowed: false,
            reason: Some("no authority bound".to_string()),
            severity: AuditSeverity::Critical,
            logged_at: SystemTime::now(),
        }
    }
}

/// Audit logger for guard decisions
pub struct AuditLogger {
    capacity: usize,
    max_contexts: usize,
    record_allowed: bool,
    /// Global event log (ring buffer)
    events: RwLock<VecDeque<AuditEvent>>,
    /// Per-context event logs
    context_events: DashMap<ContextId, VecDeque<AuditEvent>, RandomState>,
    /// Denial counters for monitoring
    denial_counts: DashMap<ContextId, u64, RandomState>,
    /// Contexts in first-seen order, for eviction
    context_order: Mutex<VecDeque<ContextId>>,
}

impl AuditLogger {
    /// `record_allowed` also keeps approvals, not just denials
    pub fn new(capacity: usize, record_allowed: bool) -> Self {
        Self::with_context_limit(capacity, record_allowed, MAX_AUDITED_CONTEXTS)
    }

    /// Keep per-context state for at most `max_contexts` contexts
    pub fn with_context_limit(capacity: usize, record_allowed: bool, max_contexts: usize) -> Self {
        Self {
            capacity,
            max_contexts: max_contexts.max(1),
            record_allowed,
            events: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            context_events: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
            context_order: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn log_decision(&self, context: ContextId, check: GuardCheck, subject: &str, authority: &str, decision: &Decision) {
        if decision.is_allowed() && !self.record_allowed {
            return;
        }
        self.log(AuditEvent::decision(context, check, subject, authority, decision));
    }

    pub(crate) fn log_unavailable(&self, context: ContextId) {
        self.log(AuditEvent::unavailable(context));
    }

    /// Record an event
    pub fn log(&self, event: AuditEvent) {
        let context = event.context;
        let is_denied = !event.allowed;

        {
            let mut events = self.events.write();
            if events.len() >= self.capacity {
                events.pop_front();
            }
            if self.capacity > 0 {
                events.push_back(event.clone());
            }
        }

        self.track_context(context);
        {
            let mut entry = self
                .context_events
                .entry(context)
                .or_insert_with(|| VecDeque::with_capacity(MAX_AUDIT_EVENTS_PER_CONTEXT));
            if entry.len() >= MAX_AUDIT_EVENTS_PER_CONTEXT {
                entry.pop_front();
            }
            entry.push_back(event);
        }

        if is_denied {
            self.denial_counts
                .entry(context)
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Note `context` as seen, forgetting the oldest contexts past the limit
    fn track_context(&self, context: ContextId) {
        if self.context_events.contains_key(&context) {
            return;
        }
        let mut order = self.context_order.lock();
        if self.context_events.contains_key(&context) {
            return;
        }
        self.context_events
            .insert(context, VecDeque::with_capacity(MAX_AUDIT_EVENTS_PER_CONTEXT));
        order.push_back(context);
        while order.len() > self.max_contexts {
            if let Some(oldest) = order.pop_front() {
                self.context_events.remove(&oldest);
                self.denial_counts.remove(&oldest);
            }
        }
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent events for one context, newest first
    pub fn for_context(&self, context: ContextId, limit: usize) -> Vec<AuditEvent> {
        match self.context_events.get(&context) {
            Some(entry) => entry.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn denial_count(&self, context: ContextId) -> u64 {
        self.denial_counts.get(&context).map(|e| *e).unwrap_or(0)
    }

    pub fn contexts_with_denials(&self) -> Vec<(ContextId, u64)> {
        self.denial_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Drop per-context state; the global ring buffer keeps its copies
    pub fn clear_context(&self, context: ContextId) {
        self.context_order.lock().retain(|id| *id != context);
        self.context_events.remove(&context);
        self.denial_counts.remove(&context);
    }

    pub fn clear_all(&self) {
        self.events.write().clear();
        self.context_order.lock().clear();
        self.context_events.clear();
        self.denial_counts.clear();
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_events: self.events.read().len(),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum(),
            contexts_tracked: self.context_events.len(),
        }
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub contexts_tracked: usize,
}
