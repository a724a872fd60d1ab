//! Template management
//!
//! Templates bundle colors, typography, and effects into one apply. Like
//! palettes, applying is server-authoritative and guarded against duplicate
//! submission, with a started/done/failed event triad per operation.

use std::rc::Rc;

use tracing::{info, warn};

use crate::api::SettingsApi;
use crate::catalog::{self, Template};
use crate::error::SyncError;
use crate::events::{EventBus, Origin, Payload, Topic};
use crate::settings::Snapshot;
use crate::state::{OperationGuards, OperationKind, StateManager};

pub struct TemplateManager {
    api: Rc<dyn SettingsApi>,
    bus: Rc<EventBus>,
    guards: OperationGuards,
    builtin: Vec<Template>,
    custom: Vec<Template>,
}

impl TemplateManager {
    pub fn new(api: Rc<dyn SettingsApi>, bus: Rc<EventBus>, guards: OperationGuards) -> Self {
        Self {
            api,
            bus,
            guards,
            builtin: catalog::builtin_templates(),
            custom: Vec::new(),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Template> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn find(&self, template_id: &str) -> Option<&Template> {
        self.all().find(|t| t.id == template_id)
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Template> {
        self.all().filter(move |t| t.category == category)
    }

    pub fn current_id<'a>(&self, state: &'a StateManager) -> Option<&'a str> {
        state.get("templates.current").and_then(|v| v.as_str())
    }

    /// Apply `template_id` and adopt the snapshot the server returns
    pub fn apply(&self, state: &mut StateManager, template_id: &str) -> Result<(), SyncError> {
        if self.find(template_id).is_none() {
            return Err(SyncError::validation(
                "templates.current",
                format!("unknown template '{template_id}'"),
            ));
        }
        let _permit = self.guards.begin(OperationKind::ApplyTemplate)?;
        self.bus.emit(
            Topic::TemplateApplyStarted,
            Payload::Operation { id: template_id.to_string() },
        );

        match self.api.apply_template(template_id) {
            Ok(snapshot) => {
                state.replace(snapshot, Origin::Template);
                info!(template_id, "template applied");
                self.bus.emit(
                    Topic::TemplateApplied,
                    Payload::Operation { id: template_id.to_string() },
                );
                Ok(())
            }
            Err(err) => {
                warn!(template_id, error = %err, "template apply failed");
                self.bus.emit(
                    Topic::TemplateApplyFailed,
                    Payload::Failure {
                        id: template_id.to_string(),
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    /// Persist the given snapshot as a named custom template
    pub fn save_custom(&mut self, name: &str, settings: &Snapshot) -> Result<String, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::validation("templates", "template name is required"));
        }
        if settings.is_empty() {
            return Err(SyncError::validation("templates", "template data is required"));
        }
        let _permit = self.guards.begin(OperationKind::SaveTemplate)?;
        self.bus.emit(
            Topic::TemplateSaveStarted,
            Payload::Operation { id: name.to_string() },
        );

        match self.api.save_custom_template(name, settings) {
            Ok(id) => {
                self.custom.push(Template {
                    id: id.clone(),
                    name: name.to_string(),
                    description: String::new(),
                    category: "custom".to_string(),
                    settings: settings
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                    is_custom: true,
                });
                info!(template_id = %id, "custom template saved");
                self.bus
                    .emit(Topic::TemplateSaved, Payload::Operation { id: id.clone() });
                Ok(id)
            }
            Err(err) => {
                warn!(name, error = %err, "custom template save failed");
                self.bus.emit(
                    Topic::TemplateSaveFailed,
                    Payload::Failure { id: name.to_string(), message: err.to_string() },
                );
                Err(err)
            }
        }
    }

    /// Remove a user-defined template. Built-ins cannot be deleted.
    pub fn delete_custom(&mut self, template_id: &str) -> Result<(), SyncError> {
        match self.find(template_id) {
            None => {
                return Err(SyncError::validation(
                    "templates",
                    format!("unknown template '{template_id}'"),
                ));
            }
            Some(tpl) if !tpl.is_custom => {
                return Err(SyncError::validation(
                    "templates",
                    format!("'{template_id}' is built in and cannot be deleted"),
                ));
            }
            Some(_) => {}
        }
        let _permit = self.guards.begin(OperationKind::DeleteTemplate)?;
        self.bus.emit(
            Topic::TemplateDeleteStarted,
            Payload::Operation { id: template_id.to_string() },
        );

        match self.api.delete_custom_template(template_id) {
            Ok(()) => {
                self.custom.retain(|t| t.id != template_id);
                info!(template_id, "custom template deleted");
                self.bus.emit(
                    Topic::TemplateDeleted,
                    Payload::Operation { id: template_id.to_string() },
                );
                Ok(())
            }
            Err(err) => {
                warn!(template_id, error = %err, "custom template delete failed");
                self.bus.emit(
                    Topic::TemplateDeleteFailed,
                    Payload::Failure {
                        id: template_id.to_string(),
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
    use std::cell::RefCell;

    use crate::api::SaveReceipt;
    use crate::settings::Schema;

    #[derive(Default)]
    struct StubApi {
        saved_templates: RefCell<Vec<String>>,
    }

    impl SettingsApi for StubApi {
        fn get_settings(&self) -> Result<Snapshot, SyncError> {
            Ok(Snapshot::from_entries(Schema::core().defaults()))
        }
        fn save_settings(&self, _snapshot: &Snapshot) -> Result<SaveReceipt, SyncError> {
            Ok(SaveReceipt { saved_at: chrono::Utc::now() })
        }
        fn apply_palette(&self, _palette_id: &str) -> Result<Snapshot, SyncError> {
            unimplemented!("not exercised here")
        }
        fn apply_template(&self, template_id: &str) -> Result<Snapshot, SyncError> {
            let tpl = catalog::builtin_templates()
                .into_iter()
                .find(|t| t.id == template_id)
                .ok_or(SyncError::Api { status: 404, message: "template not found".into() })?;
            Ok(Snapshot::from_entries(Schema::core().defaults()).with_all(tpl.settings))
        }
        fn save_custom_palette(
            &self,
            _name: &str,
            _colors: &serde_json::Value,
        ) -> Result<String, SyncError> {
            unimplemented!("not exercised here")
        }
        fn delete_custom_palette(&self, _palette_id: &str) -> Result<(), SyncError> {
            unimplemented!("not exercised here")
        }
        fn save_custom_template(&self, name: &str, _settings: &Snapshot) -> Result<String, SyncError> {
            self.saved_templates.borrow_mut().push(name.to_string());
            Ok(format!("custom-tpl-{}", self.saved_templates.borrow().len()))
        }
        fn delete_custom_template(&self, _template_id: &str) -> Result<(), SyncError> {
            Ok(())
        }
    }

    fn setup() -> (Rc<StubApi>, Rc<EventBus>, StateManager, TemplateManager) {
        let api = Rc::new(StubApi::default());
        let bus = Rc::new(EventBus::new());
        let state = StateManager::new(Rc::clone(&bus), Schema::core());
        let manager = TemplateManager::new(
            Rc::clone(&api) as Rc<dyn SettingsApi>,
            Rc::clone(&bus),
            state.guards(),
        );
        (api, bus, state, manager)
    }

    #[test]
    fn test_apply_template_bundle() {
        let (_api, _bus, mut state, manager) = setup();
        manager.apply(&mut state, "terminal").unwrap();
        assert_eq!(state.get("admin_bar.bg_color").unwrap().as_str(), Some("#0D1117"));
        assert_eq!(
            state.get("typography.content.font_family").unwrap().as_str(),
            Some("monospace")
        );
        assert_eq!(manager.current_id(&state), Some("terminal"));
    }

    #[test]
    fn test_duplicate_apply_is_rejected() {
        let (_api, _bus, state, manager) = setup();
        // Hold a permit as if a request were in flight
        let _pending = state.guards().begin(OperationKind::ApplyTemplate).unwrap();

        let mut state = state;
        let err = manager.apply(&mut state, "minimal").unwrap_err();
        assert!(matches!(
            err,
            SyncError::DuplicateOperation { kind: OperationKind::ApplyTemplate }
        ));
    }

    #[test]
    fn test_unknown_template_rejected_locally() {
        let (_api, _bus, mut state, manager) = setup();
        let err = manager.apply(&mut state, "nope").unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }

    #[test]
    fn test_save_and_delete_custom_template() {
        let (api, _bus, state, mut manager) = setup();
        let id = manager.save_custom("My Setup", &state.snapshot()).unwrap();
        assert_eq!(id, "custom-tpl-1");
        assert!(manager.find(&id).is_some_and(|t| t.is_custom));
        assert_eq!(*api.saved_templates.borrow(), vec!["My Setup".to_string()]);

        manager.delete_custom(&id).unwrap();
        assert!(manager.find(&id).is_none());
    }

    #[test]
    fn test_empty_template_data_rejected_before_api_call() {
        let (api, _bus, _state, mut manager) = setup();
        let err = manager.save_custom("My Setup", &Snapshot::default()).unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
        assert!(api.saved_templates.borrow().is_empty());
    }

    #[test]
    fn test_by_category() {
        let (_api, _bus, _state, manager) = setup();
        let modern: Vec<&str> = manager.by_category("modern").map(|t| t.id.as_str()).collect();
        assert_eq!(modern, vec!["glass", "gradient"]);
    }
}
