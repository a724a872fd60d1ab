//! Top-level session wiring
//!
//! One `Session` owns the bus, the state manager, the preview engine, and
//! both feature managers, and connects them: setting changes arm the preview
//! debounce, saves keep a persisted baseline for rollback, and preview mode
//! restores that baseline when it ends without a save.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::api::{SaveReceipt, SettingsApi};
use crate::error::SyncError;
use crate::events::{EventBus, Origin, Payload, Topic};
use crate::palette::PaletteManager;
use crate::preview::PreviewEngine;
use crate::settings::{Schema, SettingValue, Snapshot};
use crate::state::{OperationKind, StateManager};
use crate::template::TemplateManager;

pub struct Session {
    bus: Rc<EventBus>,
    state: StateManager,
    preview: Rc<RefCell<PreviewEngine>>,
    api: Rc<dyn SettingsApi>,
    pub palettes: PaletteManager,
    pub templates: TemplateManager,
    /// Last snapshot known to be persisted server-side
    persisted: Snapshot,
}

impl Session {
    pub fn new(api: Rc<dyn SettingsApi>) -> Self {
        Self::with_debounce(api, None)
    }

    pub fn with_debounce(api: Rc<dyn SettingsApi>, debounce: Option<Duration>) -> Self {
        let bus = Rc::new(EventBus::new());
        let state = StateManager::new(Rc::clone(&bus), Schema::core());
        let engine = match debounce {
            Some(window) => PreviewEngine::with_debounce(window),
            None => PreviewEngine::new(),
        };
        let preview = Rc::new(RefCell::new(engine));

        // Any state mutation arms the preview debounce; a full reload or
        // reset also drops the section caches.
        for topic in [Topic::SettingChanged, Topic::BundleApplied] {
            let preview = Rc::clone(&preview);
            bus.subscribe(topic, move |_| {
                preview.borrow_mut().note_change();
                Ok(())
            });
        }
        for topic in [Topic::SettingsLoaded, Topic::SettingsReset] {
            let preview = Rc::clone(&preview);
            bus.subscribe(topic, move |_| {
                preview.borrow_mut().clear_caches();
                Ok(())
            });
        }

        let guards = state.guards();
        let palettes = PaletteManager::new(Rc::clone(&api), Rc::clone(&bus), guards.clone());
        let templates = TemplateManager::new(Rc::clone(&api), Rc::clone(&bus), guards);
        let persisted = state.snapshot();

        Self {
            bus,
            state,
            preview,
            api,
            palettes,
            templates,
            persisted,
        }
    }

    pub fn bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.bus)
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Replace local state with what the server has stored
    pub fn load_from_server(&mut self) -> Result<(), SyncError> {
        let snapshot = self.api.get_settings()?;
        info!(entries = snapshot.len(), "settings loaded");
        self.state.replace(snapshot.clone(), Origin::Server);
        self.persisted = snapshot;
        self.bus.emit(Topic::SettingsLoaded, Payload::None);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.state.get(key)
    }

    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SyncError> {
        self.state.set(key, value, Origin::User)
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Persist the current snapshot. On failure the local state rolls back
    /// to the last persisted snapshot, so the UI never shows unsaved values
    /// as saved.
    pub fn save(&mut self) -> Result<SaveReceipt, SyncError> {
        let _permit = self.state.guards().begin(OperationKind::SaveSettings)?;
        let snapshot = self.state.snapshot();
        match self.api.save_settings(&snapshot) {
            Ok(receipt) => {
                self.persisted = snapshot.clone();
                // A save while previewing makes the previewed state the
                // thing to restore on exit
                self.preview.borrow_mut().refresh_baseline(snapshot);
                info!(saved_at = %receipt.saved_at, "settings saved");
                self.bus
                    .emit(Topic::SettingsSaved, Payload::Saved { saved_at: receipt.saved_at });
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_transport(), "save failed, rolling back");
                self.state.rollback(self.persisted.clone());
                self.bus.emit(
                    Topic::SettingsSaveFailed,
                    Payload::Failure { id: "save-settings".to_string(), message: err.to_string() },
                );
                Err(err)
            }
        }
    }

    pub fn preview_active(&self) -> bool {
        self.preview.borrow().preview_active()
    }

    pub fn enable_preview(&mut self) {
        self.preview.borrow_mut().enable_preview(self.state.snapshot());
        self.bus.emit(Topic::PreviewEnabled, Payload::None);
    }

    /// Leave preview mode and restore the state captured when it began
    pub fn disable_preview(&mut self) {
        let baseline = self.preview.borrow_mut().disable_preview();
        if let Some(baseline) = baseline {
            self.state.rollback(baseline);
            self.bus.emit(Topic::PreviewDisabled, Payload::None);
        }
    }

    /// Drive the preview debounce; call periodically with the current time
    pub fn poll(&mut self, now: Instant) -> bool {
        let snapshot = self.state.snapshot();
        let updated = self.preview.borrow_mut().poll(now, &snapshot);
        if updated {
            self.bus.emit(Topic::PreviewUpdated, Payload::None);
        }
        updated
    }

    /// Rebuild the stylesheet immediately, skipping the debounce
    pub fn force_regenerate(&mut self) {
        let snapshot = self.state.snapshot();
        self.preview.borrow_mut().regenerate(&snapshot);
        self.bus.emit(Topic::PreviewUpdated, Payload::None);
    }

    pub fn stylesheet(&self) -> String {
        self.preview.borrow().stylesheet().contents.clone()
    }

    pub fn apply_palette(&mut self, palette_id: &str) -> Result<(), SyncError> {
        self.palettes.apply(&mut self.state, palette_id)?;
        // The server merged and stored the palette, so this is persisted
        self.persisted = self.state.snapshot();
        self.preview.borrow_mut().refresh_baseline(self.persisted.clone());
        Ok(())
    }

    pub fn apply_template(&mut self, template_id: &str) -> Result<(), SyncError> {
        self.templates.apply(&mut self.state, template_id)?;
        self.persisted = self.state.snapshot();
        self.preview.borrow_mut().refresh_baseline(self.persisted.clone());
        Ok(())
    }
}
