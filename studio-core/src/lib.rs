//! # Sticker Studio Core
//!
//! Editor logic for a browser-based SVG sticker editor: URL-driven state
//! synchronization and the SVG viewBox interaction engine.
//! Platform-neutral; compiles to WASM through the `studio-app` bindings.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 studio-core                  │
//! ├──────────────────────────────────────────────┤
//! │  URL-driven store │  ViewBox engine          │
//! │  - AppState       │  - zoom / pan / auto-fit │
//! │  - share codec    │  - boundary constraints  │
//! │  - debounced sync │                          │
//! ├──────────────────────────────────────────────┤
//! │  Input layer      │  Render contract         │
//! │  - drag / wheel   │  - resolved layer bags   │
//! │  - pinch/gesture  │  - viewBox attribute     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The store owns [`AppState`]; the engine owns the viewport rect. Everything
//! else reads derived views and requests mutation through the owner's
//! operations.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod error;
pub mod geometry;
pub mod interact;
pub mod resolve;
pub mod schedule;
pub mod state;
pub mod store;
pub mod template;
pub mod viewbox;

pub use codec::DecodeError;
pub use error::{EditorError, EditorResult};
pub use interact::{InputOutcome, InteractionState, TouchPos};
pub use resolve::{resolved_layers, view_box_attr, ResolvedLayer};
pub use schedule::{Clock, Debouncer, ManualClock, SystemClock};
pub use state::{AppState, LayerOverride, OverrideValue, Overrides};
pub use store::{EditorStore, MemoryUrlSync, SubscriberId, UrlSync, DEBOUNCE_WINDOW_MS};
pub use template::{
    LayerDefinition, LayerKind, Position, StyleBag, Template, TemplateCatalog, TemplateProvider,
    ViewBox,
};
pub use viewbox::{EngineConfig, ViewBoxEngine, WheelInput};

/// Core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
