//! # Sticker Studio WASM Application
//!
//! Browser bindings for the Sticker Studio editor core.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web studio-app
//! ```
//!
//! Then wire it up in JavaScript:
//! ```javascript
//! import init, { StickerApp } from './pkg/studio_app.js';
//!
//! await init();
//! const app = new StickerApp('editor', defaultTemplateJson);
//! app.autoFit();
//!
//! window.addEventListener('popstate', () => app.handlePopState());
//! canvas.addEventListener('wheel', (e) => {
//!     if (app.handleWheel(e.deltaY, e.ctrlKey, e.offsetX, e.offsetY)) {
//!         e.preventDefault();
//!     }
//! });
//!
//! function frame() {
//!     app.tick();
//!     requestAnimationFrame(frame);
//! }
//! frame();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::cell::RefCell;
use std::rc::Rc;

use studio_core::{
    Clock, Debouncer, EditorError, EditorResult, EditorStore, EngineConfig, InteractionState,
    LayerOverride, Template, TemplateCatalog, TemplateProvider, TouchPos, UrlSync, ViewBoxEngine,
    WheelInput,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// Quiet window for container resize events, in milliseconds.
const RESIZE_DEBOUNCE_MS: f64 = 150.0;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Sticker Studio WASM initialized");
}

/// Template catalog shared between the store and the JS-facing registration
/// API.
#[derive(Clone)]
struct SharedCatalog(Rc<RefCell<TemplateCatalog>>);

impl TemplateProvider for SharedCatalog {
    fn load(&self, id: &str) -> Option<Template> {
        self.0.borrow().load(id)
    }

    fn default_template(&self) -> Template {
        self.0.borrow().default_template()
    }
}

/// Address-bar sync backed by the History API: the share token lives in the
/// URL fragment, and each debounced persist pushes one history entry.
struct BrowserUrlSync {
    window: web_sys::Window,
}

impl UrlSync for BrowserUrlSync {
    fn read_token(&self) -> Option<String> {
        let hash = self.window.location().hash().ok()?;
        let token = hash.trim_start_matches('#');
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn write_token(&mut self, token: &str) -> EditorResult<()> {
        let history = self
            .window
            .history()
            .map_err(|e| EditorError::Persistence(format!("history unavailable: {e:?}")))?;
        history
            .push_state_with_url(&JsValue::NULL, "", Some(&format!("#{token}")))
            .map_err(|e| EditorError::Persistence(format!("pushState failed: {e:?}")))
    }
}

/// `performance.now()` as the editor clock.
#[derive(Clone)]
struct PerformanceClock {
    performance: web_sys::Performance,
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        self.performance.now()
    }
}

/// The main editor application for WASM.
#[wasm_bindgen]
pub struct StickerApp {
    store: EditorStore,
    engine: ViewBoxEngine,
    input: InteractionState,
    catalog: SharedCatalog,
    container: HtmlElement,
    clock: PerformanceClock,
    resize_debounce: Debouncer,
    pending_resize: Option<(f64, f64)>,
}

#[wasm_bindgen]
impl StickerApp {
    /// Create an editor bound to the container element with the given id,
    /// seeded with the default template (JSON-encoded [`Template`]).
    ///
    /// State is adopted from the current URL fragment when it holds a valid
    /// share token.
    ///
    /// # Errors
    ///
    /// Returns an error if the container element is missing or the default
    /// template JSON is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, default_template_json: &str) -> Result<StickerApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| {
                JsValue::from_str(&format!("Container element '{container_id}' not found"))
            })?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("Container is not an HTML element"))?;
        let performance = window
            .performance()
            .ok_or_else(|| JsValue::from_str("No performance object"))?;

        let default_template: Template = serde_json::from_str(default_template_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid default template: {e}")))?;
        let catalog = SharedCatalog(Rc::new(RefCell::new(TemplateCatalog::new(default_template))));
        let clock = PerformanceClock { performance };

        let store = EditorStore::new(
            Box::new(catalog.clone()),
            Box::new(BrowserUrlSync { window }),
            Box::new(clock.clone()),
        );
        let engine = ViewBoxEngine::new(
            store.selected_template().view_box,
            EngineConfig::default(),
        );

        Ok(Self {
            store,
            engine,
            input: InteractionState::new(),
            catalog,
            container,
            clock,
            resize_debounce: Debouncer::new(RESIZE_DEBOUNCE_MS),
            pending_resize: None,
        })
    }

    /// Register a template (JSON-encoded [`Template`]) with the catalog,
    /// replacing any existing one with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the template is unusable
    /// (empty id, invalid viewBox).
    #[wasm_bindgen(js_name = registerTemplate)]
    pub fn register_template(&mut self, template_json: &str) -> Result<(), JsValue> {
        let template: Template = serde_json::from_str(template_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid template: {e}")))?;
        self.catalog
            .0
            .borrow_mut()
            .insert(template)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Re-adopt state from the current URL. Call after registering the full
    /// template catalog so share links to late-registered templates resolve.
    #[wasm_bindgen(js_name = reloadFromUrl)]
    pub fn reload_from_url(&mut self) {
        self.store.handle_navigation();
        self.sync_engine_to_template();
    }

    /// Switch templates; stale overrides are dropped and the viewport
    /// re-frames the new template.
    #[wasm_bindgen(js_name = selectTemplate)]
    pub fn select_template(&mut self, id: &str) {
        self.store.set_selected_template_id(id);
        self.sync_engine_to_template();
    }

    /// Merge a partial override (JSON object of property -> value, with
    /// `null` meaning "reset to template default") into the named layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an object.
    #[wasm_bindgen(js_name = updateLayer)]
    pub fn update_layer(&mut self, layer_id: &str, patch_json: &str) -> Result<(), JsValue> {
        let patch: LayerOverride = serde_json::from_str(patch_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid layer patch: {e}")))?;
        self.store.update_layer(layer_id, patch);
        Ok(())
    }

    /// Measure the container and frame the template. Returns `false` while
    /// the container has no layout size yet; call again after the next
    /// render.
    #[wasm_bindgen(js_name = autoFit)]
    pub fn auto_fit(&mut self) -> bool {
        let width = f64::from(self.container.offset_width());
        let height = f64::from(self.container.offset_height());
        if let Err(e) = self
            .engine
            .set_container_size(width, height)
            .and_then(|()| self.engine.auto_fit())
        {
            tracing::debug!("auto-fit deferred: {e}");
            return false;
        }
        true
    }

    /// Step zoom in around the viewport center.
    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        if let Err(e) = self.engine.zoom_in() {
            tracing::debug!("zoom in ignored: {e}");
        }
    }

    /// Step zoom out around the viewport center.
    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        if let Err(e) = self.engine.zoom_out() {
            tracing::debug!("zoom out ignored: {e}");
        }
    }

    /// Mouse button press at container coordinates. Returns `true` when the
    /// event was captured.
    #[wasm_bindgen(js_name = handlePointerDown)]
    pub fn handle_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.input.pointer_down(x, y).is_consumed()
    }

    /// Mouse move at container coordinates.
    #[wasm_bindgen(js_name = handlePointerMove)]
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.input.pointer_move(x, y, &mut self.engine).is_consumed()
    }

    /// Mouse release or pointer leaving the container.
    #[wasm_bindgen(js_name = handlePointerUp)]
    pub fn handle_pointer_up(&mut self) -> bool {
        self.input.pointer_up(&mut self.engine).is_consumed()
    }

    /// Wheel event over the container. Returns `true` when the caller should
    /// `preventDefault`.
    #[wasm_bindgen(js_name = handleWheel)]
    pub fn handle_wheel(&mut self, delta_y: f64, ctrl_key: bool, cursor_x: f64, cursor_y: f64) -> bool {
        self.input
            .wheel(
                WheelInput {
                    delta_y,
                    ctrl_key,
                    cursor_x,
                    cursor_y,
                },
                &mut self.engine,
            )
            .is_consumed()
    }

    /// Touch start with parallel x/y coordinate arrays (one entry per
    /// finger). Single touches pass through for native behavior.
    #[wasm_bindgen(js_name = handleTouchStart)]
    pub fn handle_touch_start(&mut self, xs: &[f64], ys: &[f64]) -> bool {
        let touches = Self::touches(xs, ys);
        self.input.touch_start(&touches, &self.engine).is_consumed()
    }

    /// Touch move with parallel x/y coordinate arrays.
    #[wasm_bindgen(js_name = handleTouchMove)]
    pub fn handle_touch_move(&mut self, xs: &[f64], ys: &[f64]) -> bool {
        let touches = Self::touches(xs, ys);
        self.input.touch_move(&touches, &mut self.engine).is_consumed()
    }

    /// Touch end; `xs`/`ys` describe the touches still on the surface.
    #[wasm_bindgen(js_name = handleTouchEnd)]
    pub fn handle_touch_end(&mut self, xs: &[f64], ys: &[f64]) -> bool {
        let touches = Self::touches(xs, ys);
        self.input.touch_end(&touches, &mut self.engine).is_consumed()
    }

    /// Safari `gesturestart`.
    #[wasm_bindgen(js_name = handleGestureStart)]
    pub fn handle_gesture_start(&mut self) -> bool {
        self.input.gesture_start(&self.engine).is_consumed()
    }

    /// Safari `gesturechange` with the platform-provided scale factor.
    #[wasm_bindgen(js_name = handleGestureChange)]
    pub fn handle_gesture_change(&mut self, scale: f64) -> bool {
        self.input.gesture_change(scale, &mut self.engine).is_consumed()
    }

    /// Safari `gestureend`.
    #[wasm_bindgen(js_name = handleGestureEnd)]
    pub fn handle_gesture_end(&mut self) -> bool {
        self.input.gesture_end(&mut self.engine).is_consumed()
    }

    /// Browser back/forward: restore state from the URL immediately.
    #[wasm_bindgen(js_name = handlePopState)]
    pub fn handle_pop_state(&mut self) {
        self.store.handle_navigation();
        self.sync_engine_to_template();
    }

    /// Container resize notification; applied after a quiet period so resize
    /// ticks do not thrash the viewport.
    #[wasm_bindgen(js_name = handleResize)]
    pub fn handle_resize(&mut self, width: f64, height: f64) {
        self.pending_resize = Some((width, height));
        self.resize_debounce.trigger(self.clock.now_ms());
    }

    /// Drive deferred work (URL persistence, debounced resize). Call once
    /// per animation frame.
    pub fn tick(&mut self) {
        self.store.tick();
        if self.resize_debounce.poll(self.clock.now_ms()) {
            if let Some((width, height)) = self.pending_resize.take() {
                if let Err(e) = self.engine.set_container_size(width, height) {
                    tracing::debug!("resize ignored: {e}");
                }
            }
        }
    }

    /// Persist any pending URL write immediately (e.g. on `pagehide`).
    pub fn flush(&mut self) {
        self.store.flush();
    }

    /// Toggle preview mode: while active, no input is captured.
    #[wasm_bindgen(js_name = setPreviewMode)]
    pub fn set_preview_mode(&mut self, preview: bool) {
        self.input.set_preview_mode(preview);
    }

    /// Reset to the default template with empty overrides.
    pub fn reset(&mut self) {
        self.store.reset();
        self.sync_engine_to_template();
    }

    /// The current viewport as an SVG `viewBox` attribute value.
    #[wasm_bindgen(js_name = getViewBox)]
    #[must_use]
    pub fn get_view_box(&self) -> String {
        studio_core::view_box_attr(&self.engine.rect())
    }

    /// The current derived zoom level.
    #[wasm_bindgen(js_name = getZoom)]
    #[must_use]
    pub fn get_zoom(&self) -> f64 {
        self.engine.zoom()
    }

    /// Fully resolved layers for the renderer, as a JSON array.
    #[wasm_bindgen(js_name = getResolvedLayersJson)]
    #[must_use]
    pub fn get_resolved_layers_json(&self) -> String {
        serde_json::to_string(&self.store.resolved_layers()).unwrap_or_default()
    }

    /// The share token for the current state (also served as
    /// `<token>.svg` by the service worker route).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    #[wasm_bindgen(js_name = getShareToken)]
    pub fn get_share_token(&self) -> Result<String, JsValue> {
        self.store
            .share_token()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The selected template id.
    #[wasm_bindgen(js_name = getSelectedTemplateId)]
    #[must_use]
    pub fn get_selected_template_id(&self) -> Option<String> {
        self.store.state().selected_template_id.clone()
    }

    fn touches(xs: &[f64], ys: &[f64]) -> Vec<TouchPos> {
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| TouchPos { x, y })
            .collect()
    }

    /// Rebuild the engine when the active template changed, then re-frame.
    fn sync_engine_to_template(&mut self) {
        let view_box = self.store.selected_template().view_box;
        if view_box != self.engine.template() {
            self.engine = ViewBoxEngine::new(view_box, EngineConfig::default());
        }
        self.auto_fit();
    }
}
