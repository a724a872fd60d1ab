//! Live preview engine
//!
//! Maintains the injected stylesheet for the current snapshot. Change
//! notifications arm a debounce window instead of regenerating immediately;
//! `poll` fires the regeneration once the window elapses. Each CSS section is
//! cached against a hash of the settings it reads, so a color tweak only
//! rebuilds the section that uses it.
//!
//! Preview mode keeps a baseline snapshot: entering captures the current
//! state, leaving hands it back so the caller can restore it.

pub mod css;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::constants::preview::{DEBOUNCE_MS, STYLE_ELEMENT_ID};
use crate::settings::Snapshot;

pub use css::Section;

/// Stand-in for the injected `<style>` node: one element, rewritten whole
#[derive(Debug, Clone, PartialEq)]
pub struct StyleElement {
    pub id: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
struct CachedSection {
    hash: u64,
    css: String,
}

pub struct PreviewEngine {
    style: StyleElement,
    debounce: Duration,
    state: DebounceState,
    cache: HashMap<Section, CachedSection>,
    /// Baseline captured when preview mode was entered
    baseline: Option<Snapshot>,
}

impl PreviewEngine {
    pub fn new() -> Self {
        Self::with_debounce(Duration::from_millis(DEBOUNCE_MS))
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            style: StyleElement {
                id: STYLE_ELEMENT_ID.to_string(),
                contents: String::new(),
            },
            debounce,
            state: DebounceState::Idle,
            cache: HashMap::new(),
            baseline: None,
        }
    }

    pub fn stylesheet(&self) -> &StyleElement {
        &self.style
    }

    pub fn preview_active(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn note_change(&mut self) {
        self.note_change_at(Instant::now());
    }

    /// Arm (or re-arm) the debounce window as of `now`. Changes landing
    /// inside an open window push the deadline out, coalescing bursts into
    /// one regeneration.
    pub fn note_change_at(&mut self, now: Instant) {
        self.state = DebounceState::Armed {
            deadline: now + self.debounce,
        };
    }

    /// Regenerate if an armed window has elapsed. Returns whether the
    /// stylesheet was rebuilt.
    pub fn poll(&mut self, now: Instant, settings: &Snapshot) -> bool {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                self.regenerate(settings);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> bool {
        matches!(self.state, DebounceState::Armed { .. })
    }

    /// Rebuild the stylesheet from `settings`, reusing any section whose
    /// relevant-settings hash is unchanged.
    pub fn regenerate(&mut self, settings: &Snapshot) {
        let mut contents = String::new();
        let mut rebuilt = 0usize;
        for section in Section::ALL {
            let hash = settings.subset_hash(|key| section.relevant(key));
            let cached = self.cache.get(&section);
            let css = match cached {
                Some(entry) if entry.hash == hash => entry.css.clone(),
                _ => {
                    rebuilt += 1;
                    let css = section.generate(settings);
                    self.cache.insert(section, CachedSection { hash, css: css.clone() });
                    css
                }
            };
            contents.push_str(&css);
        }
        debug!(rebuilt, total = Section::ALL.len(), "stylesheet regenerated");
        self.style.contents = contents;
    }

    pub fn clear_caches(&mut self) {
        self.cache.clear();
    }

    /// Enter preview mode: remember `current` as the restoration baseline
    /// and render it. Re-entry keeps the original baseline but still renders
    /// the state passed in.
    pub fn enable_preview(&mut self, current: Snapshot) {
        if self.baseline.is_none() {
            info!("preview mode enabled");
            self.baseline = Some(current.clone());
        }
        self.regenerate(&current);
    }

    /// Leave preview mode, returning the baseline to restore. No-op when not
    /// previewing.
    pub fn disable_preview(&mut self) -> Option<Snapshot> {
        let baseline = self.baseline.take();
        if baseline.is_some() {
            info!("preview mode disabled");
            self.state = DebounceState::Idle;
            self.style.contents.clear();
        }
        baseline
    }

    /// Adopt a new baseline after a save while previewing, so leaving preview
    /// restores what was actually persisted.
    pub fn refresh_baseline(&mut self, snapshot: Snapshot) {
        if self.baseline.is_some() {
            self.baseline = Some(snapshot);
        }
    }
}

impl Default for PreviewEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Schema, SettingValue};

    fn defaults() -> Snapshot {
        Snapshot::from_entries(Schema::core().defaults())
    }

    #[test]
    fn test_regenerate_is_idempotent() {
        let mut engine = PreviewEngine::new();
        let snap = defaults();
        engine.regenerate(&snap);
        let first = engine.stylesheet().contents.clone();
        engine.regenerate(&snap);
        assert_eq!(engine.stylesheet().contents, first);
        assert_eq!(engine.stylesheet().id, STYLE_ELEMENT_ID);
    }

    #[test]
    fn test_debounce_coalesces_bursts() {
        let mut engine = PreviewEngine::with_debounce(Duration::from_millis(300));
        let snap = defaults();
        let start = Instant::now();

        engine.note_change_at(start);
        engine.note_change_at(start + Duration::from_millis(100));
        engine.note_change_at(start + Duration::from_millis(200));
        assert!(engine.pending());

        // Window keeps sliding; nothing fires before the last deadline
        assert!(!engine.poll(start + Duration::from_millis(350), &snap));
        assert!(engine.poll(start + Duration::from_millis(500), &snap));
        assert!(!engine.pending());
        // And only once
        assert!(!engine.poll(start + Duration::from_millis(600), &snap));
    }

    #[test]
    fn test_unrelated_change_reuses_cached_sections() {
        let mut engine = PreviewEngine::new();
        let snap = defaults();
        engine.regenerate(&snap);
        let menu_hash = snap.subset_hash(|k| Section::AdminMenu.relevant(k));

        let recolored = snap.with("admin_bar.bg_color", SettingValue::text("#336699"));
        engine.regenerate(&recolored);

        // The menu section's inputs did not change
        assert_eq!(
            recolored.subset_hash(|k| Section::AdminMenu.relevant(k)),
            menu_hash
        );
        assert!(engine.stylesheet().contents.contains("#336699"));
    }

    #[test]
    fn test_preview_baseline_round_trip() {
        let mut engine = PreviewEngine::new();
        let base = defaults();
        engine.enable_preview(base.clone());
        assert!(engine.preview_active());

        // Re-entry keeps the original baseline
        let edited = base.with("admin_bar.height", SettingValue::Number(48.0));
        engine.enable_preview(edited.clone());

        let restored = engine.disable_preview().unwrap();
        assert!(restored.same_as(&base));
        assert!(!engine.preview_active());
        assert!(engine.stylesheet().contents.is_empty());
        assert!(engine.disable_preview().is_none());
    }

    #[test]
    fn test_refresh_baseline_only_while_previewing() {
        let mut engine = PreviewEngine::new();
        let base = defaults();
        let edited = base.with("admin_bar.height", SettingValue::Number(48.0));

        engine.refresh_baseline(edited.clone());
        assert!(!engine.preview_active());

        engine.enable_preview(base.clone());
        engine.refresh_baseline(edited.clone());
        assert!(engine.disable_preview().unwrap().same_as(&edited));
    }
}
