//! Central settings state and duplicate-operation guards
//!
//! The state manager owns the single authoritative snapshot. Every mutation
//! goes through schema validation, produces a new snapshot, and announces the
//! change on the bus. Long-running operations (saves, palette/template
//! applies) take a permit from the guard table first; a second request of the
//! same kind while one is pending is rejected outright rather than queued.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::events::{ChangeEvent, EventBus, Origin, Payload, Topic};
use crate::settings::{Schema, SettingValue, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    SaveSettings,
    ApplyPalette,
    ApplyTemplate,
    SavePalette,
    DeletePalette,
    SaveTemplate,
    DeleteTemplate,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationKind::SaveSettings => "save-settings",
            OperationKind::ApplyPalette => "apply-palette",
            OperationKind::ApplyTemplate => "apply-template",
            OperationKind::SavePalette => "save-palette",
            OperationKind::DeletePalette => "delete-palette",
            OperationKind::SaveTemplate => "save-template",
            OperationKind::DeleteTemplate => "delete-template",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
struct PendingOperation {
    request_id: u64,
    started_at: DateTime<Utc>,
}

/// One pending operation per kind. Cloning shares the table, so every
/// manager sees the same pending set.
#[derive(Clone, Default)]
pub struct OperationGuards {
    pending: Rc<RefCell<HashMap<OperationKind, PendingOperation>>>,
    next_id: Rc<Cell<u64>>,
}

impl OperationGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `kind`. Fails with `DuplicateOperation` while a
    /// permit for the same kind is alive.
    pub fn begin(&self, kind: OperationKind) -> Result<OperationPermit, SyncError> {
        let mut pending = self.pending.borrow_mut();
        if let Some(existing) = pending.get(&kind) {
            warn!(
                operation = %kind,
                request_id = existing.request_id,
                started_at = %existing.started_at,
                "rejecting duplicate operation"
            );
            return Err(SyncError::DuplicateOperation { kind });
        }
        let request_id = self.next_id.get() + 1;
        self.next_id.set(request_id);
        pending.insert(kind, PendingOperation { request_id, started_at: Utc::now() });
        debug!(operation = %kind, request_id, "operation started");
        Ok(OperationPermit {
            kind,
            request_id,
            pending: Rc::clone(&self.pending),
        })
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.pending.borrow().contains_key(&kind)
    }
}

/// Releases the guard slot on drop, so early returns and error paths cannot
/// leave an operation stuck pending.
#[derive(Debug)]
pub struct OperationPermit {
    kind: OperationKind,
    request_id: u64,
    pending: Rc<RefCell<HashMap<OperationKind, PendingOperation>>>,
}

impl OperationPermit {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        self.pending.borrow_mut().remove(&self.kind);
        debug!(operation = %self.kind, request_id = self.request_id, "operation finished");
    }
}

pub struct StateManager {
    bus: Rc<EventBus>,
    schema: Schema,
    current: Snapshot,
    guards: OperationGuards,
}

impl StateManager {
    pub fn new(bus: Rc<EventBus>, schema: Schema) -> Self {
        let current = Snapshot::from_entries(schema.defaults());
        Self {
            bus,
            schema,
            current,
            guards: OperationGuards::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn guards(&self) -> OperationGuards {
        self.guards.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.current.get(key)
    }

    /// Validate and apply one setting. A clamped number is applied at its
    /// clamped value and announced with a `ValidationWarning`; a hard
    /// validation failure changes nothing. The change event fires even when
    /// the new value equals the old one.
    pub fn set(&mut self, key: &str, value: SettingValue, origin: Origin) -> Result<(), SyncError> {
        let checked = self.schema.validate(key, value)?;
        if let Some(message) = &checked.clamp_warning {
            warn!(key, message = %message, "value clamped");
            self.bus.emit(
                Topic::ValidationWarning,
                Payload::Warning { key: key.to_string(), message: message.clone() },
            );
        }

        let old = self.current.get(key).cloned();
        self.current = self.current.with(key, checked.value.clone());
        self.bus.emit(
            Topic::SettingChanged,
            Payload::Change(ChangeEvent {
                key: key.to_string(),
                old,
                new: checked.value,
                origin,
                at: Utc::now(),
            }),
        );
        Ok(())
    }

    /// Apply many settings atomically: every entry is validated before any is
    /// applied, and one failure rejects the whole bundle.
    pub fn apply_bundle(
        &mut self,
        entries: impl IntoIterator<Item = (String, SettingValue)>,
        origin: Origin,
    ) -> Result<(), SyncError> {
        let mut checked = Vec::new();
        let mut errors = Vec::new();
        for (key, value) in entries {
            match self.schema.validate(&key, value) {
                Ok(c) => checked.push((key, c)),
                Err(err) => errors.push((key, err.to_string())),
            }
        }
        if !errors.is_empty() {
            warn!(rejected = errors.len(), "bundle rejected");
            self.bus.emit(
                Topic::BundleRejected,
                Payload::Bundle {
                    origin,
                    keys: errors.iter().map(|(k, _)| k.clone()).collect(),
                },
            );
            return Err(SyncError::BundleRejected { errors });
        }

        let mut keys = Vec::with_capacity(checked.len());
        for (key, c) in checked {
            if let Some(message) = &c.clamp_warning {
                warn!(key = %key, message = %message, "value clamped");
                self.bus.emit(
                    Topic::ValidationWarning,
                    Payload::Warning { key: key.clone(), message: message.clone() },
                );
            }
            let old = self.current.get(&key).cloned();
            self.current = self.current.with(key.clone(), c.value.clone());
            self.bus.emit(
                Topic::SettingChanged,
                Payload::Change(ChangeEvent {
                    key: key.clone(),
                    old,
                    new: c.value,
                    origin,
                    at: Utc::now(),
                }),
            );
            keys.push(key);
        }
        info!(changed = keys.len(), origin = %origin, "bundle applied");
        self.bus.emit(Topic::BundleApplied, Payload::Bundle { origin, keys });
        Ok(())
    }

    /// Swap in a complete snapshot (server responses, rollbacks). Emits one
    /// change event per differing key, then a bundle event listing them.
    pub fn replace(&mut self, snapshot: Snapshot, origin: Origin) {
        let changed = snapshot.changed_keys(&self.current);
        let old = std::mem::replace(&mut self.current, snapshot);
        for key in &changed {
            // Keys absent from the new snapshot are only listed in the bundle
            let Some(new) = self.current.get(key).cloned() else {
                continue;
            };
            self.bus.emit(
                Topic::SettingChanged,
                Payload::Change(ChangeEvent {
                    key: key.clone(),
                    old: old.get(key).cloned(),
                    new,
                    origin,
                    at: Utc::now(),
                }),
            );
        }
        debug!(changed = changed.len(), origin = %origin, "snapshot replaced");
        self.bus
            .emit(Topic::BundleApplied, Payload::Bundle { origin, keys: changed });
    }

    /// Restore a previously captured snapshot, attributed to the server
    pub fn rollback(&mut self, snapshot: Snapshot) {
        info!("rolling back to previous snapshot");
        self.replace(snapshot, Origin::Server);
    }

    /// Back to schema defaults
    pub fn reset(&mut self) {
        let defaults = Snapshot::from_entries(self.schema.defaults());
        self.replace(defaults, Origin::User);
        self.bus.emit(Topic::SettingsReset, Payload::None);
    }
}
