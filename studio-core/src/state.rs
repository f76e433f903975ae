//! Application state: the selected template plus sparse per-layer overrides.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::template::Template;

/// A user-supplied value for one layer property.
///
/// An explicit [`OverrideValue::Reset`] means "put this property back to the
/// template default" and is distinct from the key being absent ("never
/// touched"). Canonicalization resolves the distinction: a reset clears the
/// override key, so canonical state and encoded tokens only ever contain
/// [`OverrideValue::Set`] entries.
///
/// On the wire a reset is JSON `null`; consequently `Set(Value::Null)` is not
/// representable and decoding maps `null` back to `Reset`.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    /// Replace the template default with this value.
    Set(serde_json::Value),
    /// Explicitly return to the template default.
    Reset,
}

impl Serialize for OverrideValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::Reset => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for OverrideValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(if value.is_null() {
            Self::Reset
        } else {
            Self::Set(value)
        })
    }
}

/// Overrides for one layer: property name to value.
pub type LayerOverride = BTreeMap<String, OverrideValue>;

/// All overrides: layer id to per-layer override map.
///
/// Ordered maps keep the encoded form deterministic.
pub type Overrides = BTreeMap<String, LayerOverride>;

/// The unit of serialization: everything needed to restore an editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Currently selected template id, if any.
    pub selected_template_id: Option<String>,
    /// Sparse per-layer overrides.
    pub overrides: Overrides,
    /// Last edit time in milliseconds. Bookkeeping only; excluded from the
    /// share token so identical edits always encode identically.
    pub last_modified: f64,
}

impl AppState {
    /// Empty state with no template selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state with the given template selected.
    #[must_use]
    pub fn with_template(template_id: impl Into<String>) -> Self {
        Self {
            selected_template_id: Some(template_id.into()),
            ..Self::default()
        }
    }

    /// Merge a partial override into the named layer, creating the entry if
    /// absent. Later values win per property.
    pub fn merge_layer(&mut self, layer_id: &str, patch: LayerOverride) {
        self.overrides
            .entry(layer_id.to_string())
            .or_default()
            .extend(patch);
    }

    /// Drop overrides whose layer id does not exist in `template`.
    ///
    /// Called on template switch so stale overrides from the prior template
    /// never leak into the new one.
    pub fn prune_to_template(&mut self, template: &Template) {
        self.overrides.retain(|layer_id, _| template.has_layer(layer_id));
    }

    /// Produce the canonical form of this state.
    ///
    /// Canonicalization drops: overrides for layers absent from `template`,
    /// explicit resets, values equal to the template default, and layer
    /// entries left empty by the above. Property keys the template does not
    /// know are preserved opaquely for forward compatibility. Idempotent.
    #[must_use]
    pub fn canonicalize(&self, template: Option<&Template>) -> Self {
        let mut overrides = Overrides::new();
        for (layer_id, layer_override) in &self.overrides {
            let defaults =
                template.and_then(|t| t.layer(layer_id).map(crate::template::LayerDefinition::style));
            if template.is_some() && defaults.is_none() {
                // Stale layer from a previous template.
                continue;
            }
            let mut kept = LayerOverride::new();
            for (property, value) in layer_override {
                match value {
                    OverrideValue::Reset => {}
                    OverrideValue::Set(v) => {
                        let is_default = defaults
                            .and_then(|d| d.get(property))
                            .is_some_and(|default| default == v);
                        if !is_default {
                            kept.insert(property.clone(), OverrideValue::Set(v.clone()));
                        }
                    }
                }
            }
            if !kept.is_empty() {
                overrides.insert(layer_id.clone(), kept);
            }
        }
        Self {
            selected_template_id: self.selected_template_id.clone(),
            overrides,
            last_modified: self.last_modified,
        }
    }

    /// Compare states ignoring the bookkeeping timestamp.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.selected_template_id == other.selected_template_id && self.overrides == other.overrides
    }
}
