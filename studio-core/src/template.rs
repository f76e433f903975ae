//! Sticker templates and the layers they are built from.
//!
//! Templates are loaded by an external collaborator (the YAML template
//! loader); this module only defines the in-memory shape the editor consumes
//! and the [`TemplateProvider`] seam it reaches templates through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::geometry;

/// A rectangle in template coordinate space.
///
/// Doubles as the SVG `viewBox` rect owned by the viewBox engine.
/// Invariants: `width > 0`, `height > 0`, all components finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width (must be positive).
    pub width: f64,
    /// Height (must be positive).
    pub height: f64,
}

impl ViewBox {
    /// Create a new rect.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometric center of the rect.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check the rect invariants: finite components and positive dimensions.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        geometry::all_finite(&[self.x, self.y, self.width, self.height])
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// How a layer is positioned within the template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum Position {
    /// Absolute template coordinates.
    Absolute {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// Percentage of the template viewBox (0.0 to 100.0 per axis).
    Percent {
        /// X percentage.
        x: f64,
        /// Y percentage.
        y: f64,
    },
}

/// Default styling for a layer: property name to JSON value.
pub type StyleBag = BTreeMap<String, serde_json::Value>;

/// Discriminant for the three layer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    /// Editable text.
    Text,
    /// Vector shape.
    Shape,
    /// Embedded SVG icon.
    SvgImage,
}

/// One renderable element of a template.
///
/// Each variant carries an `id` unique within its template, positional data,
/// and a bag of default styling the renderer understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayerDefinition {
    /// An editable text layer.
    Text {
        /// Layer id, unique within the template.
        id: String,
        /// Position within the template.
        position: Position,
        /// Default styling properties.
        #[serde(default)]
        style: StyleBag,
    },
    /// A vector shape layer.
    Shape {
        /// Layer id, unique within the template.
        id: String,
        /// Position within the template.
        position: Position,
        /// Default styling properties.
        #[serde(default)]
        style: StyleBag,
    },
    /// An embedded SVG icon layer.
    SvgImage {
        /// Layer id, unique within the template.
        id: String,
        /// Position within the template.
        position: Position,
        /// Default styling properties.
        #[serde(default)]
        style: StyleBag,
    },
}

impl LayerDefinition {
    /// The layer's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::Shape { id, .. } | Self::SvgImage { id, .. } => id,
        }
    }

    /// The layer's position.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Text { position, .. }
            | Self::Shape { position, .. }
            | Self::SvgImage { position, .. } => *position,
        }
    }

    /// The layer's default styling bag.
    #[must_use]
    pub fn style(&self) -> &StyleBag {
        match self {
            Self::Text { style, .. }
            | Self::Shape { style, .. }
            | Self::SvgImage { style, .. } => style,
        }
    }

    /// The variant discriminant.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Text { .. } => LayerKind::Text,
            Self::Shape { .. } => LayerKind::Shape,
            Self::SvgImage { .. } => LayerKind::SvgImage,
        }
    }
}

/// A parameterized sticker template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Stable template identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Catalog category.
    pub category: String,
    /// Coordinate space of the template.
    pub view_box: ViewBox,
    /// Ordered layer definitions, bottom-most first.
    pub layers: Vec<LayerDefinition>,
}

impl Template {
    /// Look up a layer by id.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerDefinition> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Check whether a layer id exists in this template.
    #[must_use]
    pub fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }
}

/// Source of templates for the store.
///
/// A `None` from [`TemplateProvider::load`] is never fatal; callers fall back
/// to the default template.
pub trait TemplateProvider {
    /// Load a template by id, if known.
    fn load(&self, id: &str) -> Option<Template>;

    /// The template used when nothing else is selected or loadable.
    fn default_template(&self) -> Template;
}

/// In-memory template catalog.
///
/// The external template loader parses YAML elsewhere and feeds finished
/// [`Template`] values in here. The first registered template is the default.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Create a catalog seeded with its default template.
    #[must_use]
    pub fn new(default: Template) -> Self {
        Self {
            templates: vec![default],
        }
    }

    /// Register a template, replacing any existing one with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Template`] if the template has an empty id or
    /// an invalid viewBox; the catalog is left unchanged.
    pub fn insert(&mut self, template: Template) -> EditorResult<()> {
        if template.id.is_empty() {
            return Err(EditorError::Template("template id is empty".to_string()));
        }
        if !template.view_box.is_valid() {
            return Err(EditorError::Template(format!(
                "template '{}' has an invalid viewBox",
                template.id
            )));
        }
        if let Some(existing) = self.templates.iter_mut().find(|t| t.id == template.id) {
            *existing = template;
        } else {
            self.templates.push(template);
        }
        Ok(())
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// A catalog always holds at least its default template.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TemplateProvider for TemplateCatalog {
    fn load(&self, id: &str) -> Option<Template> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    fn default_template(&self) -> Template {
        self.templates[0].clone()
    }
}
