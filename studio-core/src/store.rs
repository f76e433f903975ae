//! The URL-driven store: single source of truth for [`AppState`],
//! synchronized with the address bar.
//!
//! The store is explicitly constructed with its collaborators injected (no
//! global singleton): a [`TemplateProvider`], a [`UrlSync`] for the address
//! bar, and a [`Clock`]. Mutations apply synchronously in memory and notify
//! subscribers before returning; only the URL write is deferred through a
//! debounce window, so rapid edits coalesce into a single history entry.

use crate::codec;
use crate::error::EditorResult;
use crate::resolve::{self, ResolvedLayer};
use crate::schedule::{Clock, Debouncer};
use crate::state::{AppState, LayerOverride};
use crate::template::{Template, TemplateProvider};

/// Debounce window for URL writes, in milliseconds.
pub const DEBOUNCE_WINDOW_MS: f64 = 500.0;

/// Address-bar access as the store sees it.
///
/// Production uses a History-API implementation in the app crate;
/// [`MemoryUrlSync`] serves tests and headless embedding.
pub trait UrlSync {
    /// The token currently in the address bar, if any.
    fn read_token(&self) -> Option<String>;

    /// Publish a new token to the address bar.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Persistence`] if the platform rejects the
    /// write.
    fn write_token(&mut self, token: &str) -> EditorResult<()>;
}

/// In-memory [`UrlSync`] that records every write.
#[derive(Debug, Default)]
pub struct MemoryUrlSync {
    token: Option<String>,
    writes: usize,
}

impl MemoryUrlSync {
    /// Empty address bar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address bar pre-seeded with a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            writes: 0,
        }
    }

    /// The last written (or seeded) token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// How many writes have happened.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl UrlSync for MemoryUrlSync {
    fn read_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn write_token(&mut self, token: &str) -> EditorResult<()> {
        self.token = Some(token.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Handle for removing a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type SubscriberFn = Box<dyn FnMut(&AppState)>;

/// Reactive state container synchronized with the address bar.
pub struct EditorStore {
    state: AppState,
    templates: Box<dyn TemplateProvider>,
    url: Box<dyn UrlSync>,
    clock: Box<dyn Clock>,
    debounce: Debouncer,
    subscribers: Vec<(SubscriberId, SubscriberFn)>,
    next_subscriber: u64,
}

impl EditorStore {
    /// Build a store, adopting state from the current URL when it decodes,
    /// falling back to the default template otherwise.
    #[must_use]
    pub fn new(
        templates: Box<dyn TemplateProvider>,
        url: Box<dyn UrlSync>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let state = Self::restore(&*templates, &*url);
        Self {
            state,
            templates,
            url,
            clock,
            debounce: Debouncer::new(DEBOUNCE_WINDOW_MS),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Decode the address bar into state, falling back to defaults on any
    /// failure. A syntactically valid token naming an unknown template also
    /// falls back: a dead link degrades to a working editor.
    fn restore(templates: &dyn TemplateProvider, url: &dyn UrlSync) -> AppState {
        let default_state = || AppState::with_template(templates.default_template().id);
        let Some(token) = url.read_token() else {
            return default_state();
        };
        match codec::decode(&token) {
            Ok(mut state) => {
                let template = state
                    .selected_template_id
                    .as_deref()
                    .and_then(|id| templates.load(id));
                match template {
                    Some(template) => {
                        state.prune_to_template(&template);
                        state
                    }
                    None => {
                        if let Some(id) = &state.selected_template_id {
                            tracing::warn!("unknown template '{id}' in URL, using default");
                        }
                        default_state()
                    }
                }
            }
            Err(e) => {
                tracing::warn!("unusable share token ({e}), using default template");
                default_state()
            }
        }
    }

    /// Synchronous read of the current state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The template the state refers to, falling back to the provider's
    /// default when the id is unset or unknown.
    #[must_use]
    pub fn selected_template(&self) -> Template {
        self.state
            .selected_template_id
            .as_deref()
            .and_then(|id| self.templates.load(id))
            .unwrap_or_else(|| self.templates.default_template())
    }

    /// Register a state-change callback; it fires after every mutation, and
    /// once immediately on external navigation restores.
    pub fn subscribe(&mut self, callback: impl FnMut(&AppState) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Merge a partial override into the named layer: synchronous in-memory
    /// apply, debounced URL persist.
    pub fn update_layer(&mut self, layer_id: &str, patch: LayerOverride) {
        self.state.merge_layer(layer_id, patch);
        self.touch();
    }

    /// Switch templates, dropping overrides for layer ids the new template
    /// does not have. An unknown id falls back to the default template.
    pub fn set_selected_template_id(&mut self, id: &str) {
        let template = match self.templates.load(id) {
            Some(template) => template,
            None => {
                tracing::warn!("unknown template '{id}', selecting default");
                self.templates.default_template()
            }
        };
        self.state.selected_template_id = Some(template.id.clone());
        self.state.prune_to_template(&template);
        self.touch();
    }

    /// Reset to the default template with empty overrides.
    pub fn reset(&mut self) {
        self.state = AppState::with_template(self.templates.default_template().id);
        self.touch();
    }

    /// Drive the debounce timer; called from the host's frame loop. Fires at
    /// most one URL write per quiet period, reflecting the latest state.
    pub fn tick(&mut self) {
        if self.debounce.poll(self.clock.now_ms()) {
            self.persist();
        }
    }

    /// Persist immediately if a write is pending (e.g. before page unload).
    pub fn flush(&mut self) {
        if self.debounce.is_pending() {
            self.debounce.cancel();
            self.persist();
        }
    }

    /// External navigation (browser back/forward): re-read the URL and
    /// overwrite in-memory state, bypassing the debounce, then notify.
    pub fn handle_navigation(&mut self) {
        self.debounce.cancel();
        self.state = Self::restore(&*self.templates, &*self.url);
        self.notify();
    }

    /// The share token for the current state.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Persistence`] if encoding fails.
    pub fn share_token(&self) -> EditorResult<String> {
        codec::encode(&self.state, self.canonical_template().as_ref())
    }

    /// Fully resolved layers for the renderer.
    #[must_use]
    pub fn resolved_layers(&self) -> Vec<ResolvedLayer> {
        resolve::resolved_layers(&self.selected_template(), &self.state.overrides)
    }

    /// The template canonicalization runs against: the selected one if it
    /// resolves, otherwise none (overrides then pass through untouched).
    fn canonical_template(&self) -> Option<Template> {
        self.state
            .selected_template_id
            .as_deref()
            .and_then(|id| self.templates.load(id))
    }

    fn touch(&mut self) {
        let now = self.clock.now_ms();
        self.state.last_modified = now;
        self.debounce.trigger(now);
        self.notify();
    }

    fn notify(&mut self) {
        let state = self.state.clone();
        for (_, callback) in &mut self.subscribers {
            callback(&state);
        }
    }

    /// Encode and write the URL. Failure is logged and skipped: in-memory
    /// state stays authoritative, the session only loses shareability until
    /// the next successful write.
    fn persist(&mut self) {
        let token = codec::encode(&self.state, self.canonical_template().as_ref());
        match token {
            Ok(token) => {
                if let Err(e) = self.url.write_token(&token) {
                    tracing::warn!("URL write failed, keeping in-memory state: {e}");
                }
            }
            Err(e) => {
                tracing::warn!("state encoding failed, skipping URL write: {e}");
            }
        }
    }
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("state", &self.state)
            .field("debounce", &self.debounce)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualClock;
    use crate::state::OverrideValue;
    use crate::template::{LayerDefinition, Position, StyleBag, TemplateCatalog, ViewBox};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn text_layer(id: &str) -> LayerDefinition {
        let mut style = StyleBag::new();
        style.insert("fontSize".to_string(), json!(24));
        LayerDefinition::Text {
            id: id.to_string(),
            position: Position::Percent { x: 50.0, y: 40.0 },
            style,
        }
    }

    fn template(id: &str, layer_id: &str) -> Template {
        Template {
            id: id.to_string(),
            name: id.to_string(),
            category: "basic".to_string(),
            view_box: ViewBox::new(0.0, 0.0, 400.0, 300.0),
            layers: vec![text_layer(layer_id)],
        }
    }

    fn catalog() -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new(template("template-a", "layer1"));
        catalog
            .insert(template("template-b", "layer2"))
            .expect("insert");
        catalog
    }

    fn store_with_url(
        url: MemoryUrlSync,
    ) -> (EditorStore, Rc<ManualClock>, Rc<RefCell<MemoryUrlSync>>) {
        let clock = Rc::new(ManualClock::new());
        let url = Rc::new(RefCell::new(url));
        let store = EditorStore::new(
            Box::new(catalog()),
            Box::new(SharedUrl(Rc::clone(&url))),
            Box::new(SharedClock(Rc::clone(&clock))),
        );
        (store, clock, url)
    }

    struct SharedClock(Rc<ManualClock>);
    impl Clock for SharedClock {
        fn now_ms(&self) -> f64 {
            self.0.now_ms()
        }
    }

    struct SharedUrl(Rc<RefCell<MemoryUrlSync>>);
    impl UrlSync for SharedUrl {
        fn read_token(&self) -> Option<String> {
            self.0.borrow().read_token()
        }
        fn write_token(&mut self, token: &str) -> EditorResult<()> {
            self.0.borrow_mut().write_token(token)
        }
    }

    fn patch(property: &str, value: serde_json::Value) -> LayerOverride {
        let mut p = LayerOverride::new();
        p.insert(property.to_string(), OverrideValue::Set(value));
        p
    }

    #[test]
    fn test_fresh_load_uses_default_template() {
        let (store, _clock, _url) = store_with_url(MemoryUrlSync::new());
        assert_eq!(
            store.state().selected_template_id.as_deref(),
            Some("template-a")
        );
        assert!(store.state().overrides.is_empty());
    }

    #[test]
    fn test_malformed_token_falls_back_to_default() {
        let (store, _clock, _url) = store_with_url(MemoryUrlSync::with_token("???invalid"));
        assert_eq!(
            store.state().selected_template_id.as_deref(),
            Some("template-a")
        );
    }

    #[test]
    fn test_valid_token_is_adopted() {
        let mut state = AppState::with_template("template-b");
        state.merge_layer("layer2", patch("fontSize", json!(40)));
        let token = codec::encode(&state, None).expect("encode");
        let (store, _clock, _url) = store_with_url(MemoryUrlSync::with_token(token));
        assert_eq!(
            store.state().selected_template_id.as_deref(),
            Some("template-b")
        );
        assert!(store.state().overrides.contains_key("layer2"));
    }

    #[test]
    fn test_update_layer_applies_synchronously_and_defers_write() {
        let (mut store, clock, url) = store_with_url(MemoryUrlSync::new());
        store.update_layer("layer1", patch("fontSize", json!(40)));
        assert!(store.state().overrides.contains_key("layer1"));
        store.tick();
        clock.advance(100.0);
        store.tick();
        // Inside the debounce window: no write yet.
        assert_eq!(url.borrow().write_count(), 0);
        clock.advance(DEBOUNCE_WINDOW_MS);
        store.tick();
        assert_eq!(url.borrow().write_count(), 1);
    }

    #[test]
    fn test_debounce_coalesces_rapid_edits() {
        let (mut store, clock, url) = store_with_url(MemoryUrlSync::new());
        for size in [30, 32, 34, 36, 38] {
            store.update_layer("layer1", patch("fontSize", json!(size)));
            clock.advance(50.0);
            store.tick();
        }
        clock.advance(DEBOUNCE_WINDOW_MS);
        store.tick();
        // Five edits inside one window: exactly one write, of the last state.
        assert_eq!(url.borrow().write_count(), 1);
        let token = url.borrow().token().expect("token").to_string();
        let decoded = codec::decode(&token).expect("decode");
        assert_eq!(
            decoded.overrides["layer1"]["fontSize"],
            OverrideValue::Set(json!(38))
        );
    }

    #[test]
    fn test_template_switch_drops_stale_overrides() {
        let (mut store, _clock, _url) = store_with_url(MemoryUrlSync::new());
        store.update_layer("layer1", patch("fontSize", json!(40)));
        store.set_selected_template_id("template-b");
        assert!(!store.state().overrides.contains_key("layer1"));
    }

    #[test]
    fn test_unknown_template_switch_selects_default() {
        let (mut store, _clock, _url) = store_with_url(MemoryUrlSync::new());
        store.set_selected_template_id("nope");
        assert_eq!(
            store.state().selected_template_id.as_deref(),
            Some("template-a")
        );
    }

    #[test]
    fn test_subscribers_observe_every_mutation() {
        let (mut store, _clock, _url) = store_with_url(MemoryUrlSync::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |state| {
            sink.borrow_mut()
                .push(state.selected_template_id.clone());
        });
        store.set_selected_template_id("template-b");
        store.update_layer("layer2", patch("fontSize", json!(40)));
        assert_eq!(seen.borrow().len(), 2);
        store.unsubscribe(id);
        store.reset();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_navigation_overwrites_state_and_cancels_pending_write() {
        let mut navigated = AppState::with_template("template-b");
        navigated.merge_layer("layer2", patch("fontSize", json!(60)));
        let token = codec::encode(&navigated, None).expect("encode");

        let (mut store, clock, url) = store_with_url(MemoryUrlSync::with_token(token));
        store.update_layer("layer2", patch("fontSize", json!(99)));
        // Back/forward fires before the debounce window elapses.
        store.handle_navigation();
        assert_eq!(
            store.state().overrides["layer2"]["fontSize"],
            OverrideValue::Set(json!(60))
        );
        clock.advance(10.0 * DEBOUNCE_WINDOW_MS);
        store.tick();
        // The cancelled edit never reaches the URL.
        assert_eq!(url.borrow().write_count(), 0);
    }

    #[test]
    fn test_flush_writes_pending_state_immediately() {
        let (mut store, _clock, url) = store_with_url(MemoryUrlSync::new());
        store.update_layer("layer1", patch("fontSize", json!(44)));
        store.flush();
        assert_eq!(url.borrow().write_count(), 1);
        store.flush(); // no-op when nothing is pending
        assert_eq!(url.borrow().write_count(), 1);
    }

    #[test]
    fn test_resolved_layers_reflect_overrides() {
        let (mut store, _clock, _url) = store_with_url(MemoryUrlSync::new());
        store.update_layer("layer1", patch("fontSize", json!(44)));
        let layers = store.resolved_layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].props["fontSize"], json!(44));
    }
}
