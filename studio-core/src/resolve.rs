//! The consumer-facing render contract: template defaults merged with
//! overrides into flat per-layer property bags, plus the viewBox attribute
//! string.
//!
//! The renderer (external) turns these into SVG markup; nothing here knows
//! about markup.

use serde::Serialize;

use crate::state::{OverrideValue, Overrides};
use crate::template::{LayerKind, Position, StyleBag, Template, ViewBox};

/// One layer with its styling fully resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLayer {
    /// Layer id.
    pub id: String,
    /// Layer variant.
    pub kind: LayerKind,
    /// Position within the template.
    pub position: Position,
    /// Flat property bag: template defaults overlaid with overrides.
    pub props: StyleBag,
}

/// Resolve every layer of `template` against `overrides`, in template layer
/// order.
///
/// An [`OverrideValue::Reset`] leaves the template default in place; override
/// keys the template does not know are passed through so newer links still
/// render what they can.
#[must_use]
pub fn resolved_layers(template: &Template, overrides: &Overrides) -> Vec<ResolvedLayer> {
    template
        .layers
        .iter()
        .map(|layer| {
            let mut props = layer.style().clone();
            if let Some(layer_override) = overrides.get(layer.id()) {
                for (property, value) in layer_override {
                    match value {
                        OverrideValue::Set(v) => {
                            props.insert(property.clone(), v.clone());
                        }
                        OverrideValue::Reset => {}
                    }
                }
            }
            ResolvedLayer {
                id: layer.id().to_string(),
                kind: layer.kind(),
                position: layer.position(),
                props,
            }
        })
        .collect()
}

/// The rect as an SVG `viewBox` attribute value: four space-separated
/// numbers.
#[must_use]
pub fn view_box_attr(rect: &ViewBox) -> String {
    format!("{} {} {} {}", rect.x, rect.y, rect.width, rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LayerOverride;
    use crate::template::LayerDefinition;
    use serde_json::json;

    fn template() -> Template {
        let mut style = StyleBag::new();
        style.insert("fontSize".to_string(), json!(24));
        style.insert("fill".to_string(), json!("#000000"));
        Template {
            id: "badge".to_string(),
            name: "Badge".to_string(),
            category: "basic".to_string(),
            view_box: ViewBox::new(0.0, 0.0, 400.0, 300.0),
            layers: vec![LayerDefinition::Text {
                id: "title".to_string(),
                position: Position::Percent { x: 50.0, y: 40.0 },
                style,
            }],
        }
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let template = template();
        let mut overrides = Overrides::new();
        let mut layer = LayerOverride::new();
        layer.insert("fontSize".to_string(), OverrideValue::Set(json!(40)));
        overrides.insert("title".to_string(), layer);

        let resolved = resolved_layers(&template, &overrides);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].props["fontSize"], json!(40));
        assert_eq!(resolved[0].props["fill"], json!("#000000"));
    }

    #[test]
    fn test_reset_keeps_template_default() {
        let template = template();
        let mut overrides = Overrides::new();
        let mut layer = LayerOverride::new();
        layer.insert("fontSize".to_string(), OverrideValue::Reset);
        overrides.insert("title".to_string(), layer);

        let resolved = resolved_layers(&template, &overrides);
        assert_eq!(resolved[0].props["fontSize"], json!(24));
    }

    #[test]
    fn test_unknown_override_keys_pass_through() {
        let template = template();
        let mut overrides = Overrides::new();
        let mut layer = LayerOverride::new();
        layer.insert("glowRadius".to_string(), OverrideValue::Set(json!(3.5)));
        overrides.insert("title".to_string(), layer);

        let resolved = resolved_layers(&template, &overrides);
        assert_eq!(resolved[0].props["glowRadius"], json!(3.5));
    }

    #[test]
    fn test_view_box_attr_format() {
        let rect = ViewBox::new(-24.0, 0.0, 448.0, 336.5);
        assert_eq!(view_box_attr(&rect), "-24 0 448 336.5");
    }
}
