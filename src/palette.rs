//! Palette management
//!
//! Applying a palette is server-authoritative: the backend merges the
//! palette's colors into the stored settings and returns the resulting
//! snapshot, which is adopted wholesale. Every operation announces a
//! started/done/failed event triad and takes an operation permit, so a
//! second click while a request is in flight is rejected instead of queued.

use std::rc::Rc;

use serde_json::json;
use tracing::{info, warn};

use crate::api::SettingsApi;
use crate::catalog::{self, Palette, PaletteColors};
use crate::error::SyncError;
use crate::events::{EventBus, Origin, Payload, Topic};
use crate::state::{OperationGuards, OperationKind, StateManager};

pub struct PaletteManager {
    api: Rc<dyn SettingsApi>,
    bus: Rc<EventBus>,
    guards: OperationGuards,
    builtin: Vec<Palette>,
    custom: Vec<Palette>,
}

impl PaletteManager {
    pub fn new(api: Rc<dyn SettingsApi>, bus: Rc<EventBus>, guards: OperationGuards) -> Self {
        Self {
            api,
            bus,
            guards,
            builtin: catalog::builtin_palettes(),
            custom: Vec::new(),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Palette> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn find(&self, palette_id: &str) -> Option<&Palette> {
        self.all().find(|p| p.id == palette_id)
    }

    pub fn current_id<'a>(&self, state: &'a StateManager) -> Option<&'a str> {
        state.get("palettes.current").and_then(|v| v.as_str())
    }

    /// Apply `palette_id` and adopt the snapshot the server returns
    pub fn apply(&self, state: &mut StateManager, palette_id: &str) -> Result<(), SyncError> {
        if self.find(palette_id).is_none() {
            return Err(SyncError::validation(
                "palettes.current",
                format!("unknown palette '{palette_id}'"),
            ));
        }
        let _permit = self.guards.begin(OperationKind::ApplyPalette)?;
        self.bus.emit(
            Topic::PaletteApplyStarted,
            Payload::Operation { id: palette_id.to_string() },
        );

        match self.api.apply_palette(palette_id) {
            Ok(snapshot) => {
                state.replace(snapshot, Origin::Palette);
                info!(palette_id, "palette applied");
                self.bus.emit(
                    Topic::PaletteApplied,
                    Payload::Operation { id: palette_id.to_string() },
                );
                Ok(())
            }
            Err(err) => {
                warn!(palette_id, error = %err, "palette apply failed");
                self.bus.emit(
                    Topic::PaletteApplyFailed,
                    Payload::Failure {
                        id: palette_id.to_string(),
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    /// Persist a user-defined palette; the server assigns its id
    pub fn save_custom(
        &mut self,
        name: &str,
        colors: PaletteColors,
    ) -> Result<String, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::validation("palettes", "palette name is required"));
        }
        let _permit = self.guards.begin(OperationKind::SavePalette)?;
        self.bus.emit(
            Topic::PaletteSaveStarted,
            Payload::Operation { id: name.to_string() },
        );

        let body = json!({
            "primary": colors.primary.as_str(),
            "secondary": colors.secondary.as_str(),
            "accent": colors.accent.as_str(),
            "background": colors.background.as_str(),
            "text": colors.text.as_str(),
            "text_secondary": colors.text_secondary.as_str(),
        });
        match self.api.save_custom_palette(name, &body) {
            Ok(id) => {
                self.custom.push(Palette {
                    id: id.clone(),
                    name: name.to_string(),
                    bar_bg: colors.primary.to_string(),
                    bar_text: "#ffffff".to_string(),
                    menu_bg: colors.secondary.to_string(),
                    menu_text: "#ffffff".to_string(),
                    menu_hover_bg: colors.primary.to_string(),
                    menu_hover_text: colors.background.to_string(),
                    colors,
                    is_custom: true,
                });
                info!(palette_id = %id, "custom palette saved");
                self.bus
                    .emit(Topic::PaletteSaved, Payload::Operation { id: id.clone() });
                Ok(id)
            }
            Err(err) => {
                warn!(name, error = %err, "custom palette save failed");
                self.bus.emit(
                    Topic::PaletteSaveFailed,
                    Payload::Failure { id: name.to_string(), message: err.to_string() },
                );
                Err(err)
            }
        }
    }

    /// Remove a user-defined palette. Built-ins cannot be deleted.
    pub fn delete_custom(&mut self, palette_id: &str) -> Result<(), SyncError> {
        match self.find(palette_id) {
            None => {
                return Err(SyncError::validation(
                    "palettes",
                    format!("unknown palette '{palette_id}'"),
                ));
            }
            Some(palette) if !palette.is_custom => {
                return Err(SyncError::validation(
                    "palettes",
                    format!("'{palette_id}' is built in and cannot be deleted"),
                ));
            }
            Some(_) => {}
        }
        let _permit = self.guards.begin(OperationKind::DeletePalette)?;
        self.bus.emit(
            Topic::PaletteDeleteStarted,
            Payload::Operation { id: palette_id.to_string() },
        );

        match self.api.delete_custom_palette(palette_id) {
            Ok(()) => {
                self.custom.retain(|p| p.id != palette_id);
                info!(palette_id, "custom palette deleted");
                self.bus.emit(
                    Topic::PaletteDeleted,
                    Payload::Operation { id: palette_id.to_string() },
                );
                Ok(())
            }
            Err(err) => {
                warn!(palette_id, error = %err, "custom palette delete failed");
                self.bus.emit(
                    Topic::PaletteDeleteFailed,
                    Payload::Failure {
                        id: palette_id.to_string(),
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use crate::api::SaveReceipt;
    use crate::settings::{Schema, Snapshot};

    /// Stub backend: counts calls, optionally fails palette applies
    #[derive(Default)]
    struct StubApi {
        apply_calls: Cell<usize>,
        fail_apply: Cell<bool>,
        deleted: RefCell<Vec<String>>,
    }

    impl SettingsApi for StubApi {
        fn get_settings(&self) -> Result<Snapshot, SyncError> {
            Ok(Snapshot::from_entries(Schema::core().defaults()))
        }
        fn save_settings(&self, _snapshot: &Snapshot) -> Result<SaveReceipt, SyncError> {
            Ok(SaveReceipt { saved_at: chrono::Utc::now() })
        }
        fn apply_palette(&self, palette_id: &str) -> Result<Snapshot, SyncError> {
            self.apply_calls.set(self.apply_calls.get() + 1);
            if self.fail_apply.get() {
                return Err(SyncError::Server { status: 500 });
            }
            let palette = catalog::builtin_palettes()
                .into_iter()
                .find(|p| p.id == palette_id)
                .ok_or(SyncError::Api { status: 404, message: "palette not found".into() })?;
            Ok(Snapshot::from_entries(Schema::core().defaults()).with_all(palette.entries()))
        }
        fn apply_template(&self, _template_id: &str) -> Result<Snapshot, SyncError> {
            unimplemented!("not exercised here")
        }
        fn save_custom_palette(
            &self,
            _name: &str,
            _colors: &serde_json::Value,
        ) -> Result<String, SyncError> {
            Ok("custom-1".to_string())
        }
        fn delete_custom_palette(&self, palette_id: &str) -> Result<(), SyncError> {
            self.deleted.borrow_mut().push(palette_id.to_string());
            Ok(())
        }
        fn save_custom_template(
            &self,
            _name: &str,
            _settings: &Snapshot,
        ) -> Result<String, SyncError> {
            unimplemented!("not exercised here")
        }
        fn delete_custom_template(&self, _template_id: &str) -> Result<(), SyncError> {
            unimplemented!("not exercised here")
        }
    }

    fn setup() -> (Rc<StubApi>, Rc<EventBus>, StateManager, PaletteManager) {
        let api = Rc::new(StubApi::default());
        let bus = Rc::new(EventBus::new());
        let state = StateManager::new(Rc::clone(&bus), Schema::core());
        let manager = PaletteManager::new(
            Rc::clone(&api) as Rc<dyn SettingsApi>,
            Rc::clone(&bus),
            state.guards(),
        );
        (api, bus, state, manager)
    }

    #[test]
    fn test_apply_adopts_server_snapshot() {
        let (api, bus, mut state, manager) = setup();
        let events = Rc::new(RefCell::new(Vec::new()));
        for (topic, label) in [
            (Topic::PaletteApplyStarted, "started"),
            (Topic::PaletteApplied, "applied"),
            (Topic::PaletteApplyFailed, "failed"),
        ] {
            let events = Rc::clone(&events);
            bus.subscribe(topic, move |_| {
                events.borrow_mut().push(label);
                Ok(())
            });
        }

        let applied_id = Rc::new(RefCell::new(String::new()));
        {
            let applied_id = Rc::clone(&applied_id);
            bus.subscribe(Topic::PaletteApplied, move |payload| {
                if let Payload::Operation { id } = payload {
                    *applied_id.borrow_mut() = id.clone();
                }
                Ok(())
            });
        }

        manager.apply(&mut state, "ocean-breeze").unwrap();

        assert_eq!(api.apply_calls.get(), 1);
        assert_eq!(state.get("admin_bar.bg_color").unwrap().as_str(), Some("#0EA5E9"));
        assert_eq!(state.get("palettes.current").unwrap().as_str(), Some("ocean-breeze"));
        assert_eq!(*events.borrow(), vec!["started", "applied"]);
        assert_eq!(*applied_id.borrow(), "ocean-breeze");
    }

    #[test]
    fn test_duplicate_apply_never_reaches_server() {
        let (api, _bus, mut state, manager) = setup();
        let _pending = state.guards().begin(OperationKind::ApplyPalette).unwrap();

        let err = manager.apply(&mut state, "sunset").unwrap_err();
        assert!(matches!(
            err,
            SyncError::DuplicateOperation { kind: OperationKind::ApplyPalette }
        ));
        assert_eq!(api.apply_calls.get(), 0);
    }

    #[test]
    fn test_unknown_palette_never_reaches_server() {
        let (api, _bus, mut state, manager) = setup();
        let err = manager.apply(&mut state, "no-such-palette").unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
        assert_eq!(api.apply_calls.get(), 0);
    }

    #[test]
    fn test_failed_apply_leaves_state_and_emits_failure() {
        let (api, bus, mut state, manager) = setup();
        api.fail_apply.set(true);
        let failed = Rc::new(Cell::new(false));
        {
            let failed = Rc::clone(&failed);
            bus.subscribe(Topic::PaletteApplyFailed, move |_| {
                failed.set(true);
                Ok(())
            });
        }
        let before = state.snapshot();

        let err = manager.apply(&mut state, "sunset").unwrap_err();
        assert!(matches!(err, SyncError::Server { status: 500 }));
        assert!(state.snapshot().same_as(&before));
        assert!(failed.get());
    }

    #[test]
    fn test_save_custom_requires_name() {
        let (_api, _bus, _state, mut manager) = setup();
        let colors = PaletteColors {
            primary: "#111111".to_string(),
            secondary: "#222222".to_string(),
            accent: "#333333".to_string(),
            background: "#ffffff".to_string(),
            text: "#000000".to_string(),
            text_secondary: "#444444".to_string(),
        };
        let err = manager.save_custom("   ", colors.clone()).unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));

        let id = manager.save_custom("My Palette", colors).unwrap();
        assert_eq!(id, "custom-1");
        assert!(manager.find("custom-1").is_some_and(|p| p.is_custom));
    }

    #[test]
    fn test_builtin_palettes_cannot_be_deleted() {
        let (api, _bus, _state, mut manager) = setup();
        let err = manager.delete_custom("sunset").unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
        assert!(api.deleted.borrow().is_empty());
    }

    #[test]
    fn test_delete_custom_palette() {
        let (api, _bus, _state, mut manager) = setup();
        let colors = PaletteColors {
            primary: "#111111".to_string(),
            secondary: "#222222".to_string(),
            accent: "#333333".to_string(),
            background: "#ffffff".to_string(),
            text: "#000000".to_string(),
            text_secondary: "#444444".to_string(),
        };
        manager.save_custom("Mine", colors).unwrap();
        manager.delete_custom("custom-1").unwrap();
        assert!(manager.find("custom-1").is_none());
        assert_eq!(*api.deleted.borrow(), vec!["custom-1".to_string()]);
    }
}
