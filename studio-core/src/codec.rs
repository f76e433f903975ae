//! Share-token codec: lossless, compact, URL-safe serialization of
//! [`AppState`].
//!
//! The wire form is versioned compact JSON wrapped in unpadded URL-safe
//! base64. Encoding canonicalizes first (ordered maps, default-equal values
//! dropped, timestamp excluded), so two semantically identical states always
//! produce byte-identical tokens and `decode(encode(s)) == canonicalize(s)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::state::{AppState, Overrides};
use crate::template::Template;

/// Current wire format version.
pub const TOKEN_VERSION: u64 = 1;

/// Reasons a share token failed to decode.
///
/// Callers must fall back to default state on any of these, never crash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The token is not valid base64/JSON or is missing a required field.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token was cut short, e.g. by URL truncation.
    #[error("truncated token")]
    Truncated,

    /// The token was produced by an incompatible format version.
    #[error("unsupported token version: {0}")]
    UnsupportedVersion(u64),
}

/// Compact wire representation. Field names are single letters to keep URLs
/// short.
#[derive(Debug, Serialize, Deserialize)]
struct WireState {
    /// Format version.
    v: u64,
    /// Selected template id. The key is required; `null` means "none".
    #[serde(deserialize_with = "required_nullable_id")]
    t: Option<String>,
    /// Sparse overrides. Unknown property keys round-trip untouched.
    #[serde(default)]
    o: Overrides,
}

/// Deserialize an `Option<String>` while still treating a *missing* key as an
/// error (serde's default `Option` handling would silently accept it).
fn required_nullable_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer)
}

/// Encode application state into a deterministic URL-safe token.
///
/// The state is canonicalized against `template` first so override entries
/// equal to template defaults never inflate the URL.
///
/// # Errors
///
/// Returns [`EditorError::Persistence`] if JSON serialization fails, which
/// the contracts of the involved types should make impossible; callers log
/// and skip the URL write.
pub fn encode(state: &AppState, template: Option<&Template>) -> EditorResult<String> {
    let canonical = state.canonicalize(template);
    let wire = WireState {
        v: TOKEN_VERSION,
        t: canonical.selected_template_id,
        o: canonical.overrides,
    };
    let json = serde_json::to_vec(&wire)
        .map_err(|e| EditorError::Persistence(format!("token serialization failed: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a share token back into application state.
///
/// The returned state carries a zero `last_modified`; it has not been edited
/// in this session yet.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing why the token is unusable.
pub fn decode(token: &str) -> Result<AppState, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Truncated);
    }

    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|e| match e {
        base64::DecodeError::InvalidLength(_) => DecodeError::Truncated,
        other => DecodeError::Malformed(other.to_string()),
    })?;

    // Check the version before committing to the full schema so a future
    // format bump reports UnsupportedVersion rather than Malformed.
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        if e.classify() == serde_json::error::Category::Eof {
            DecodeError::Truncated
        } else {
            DecodeError::Malformed(e.to_string())
        }
    })?;
    let version = value
        .get("v")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| DecodeError::Malformed("missing version field".to_string()))?;
    if version != TOKEN_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let wire: WireState =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    Ok(AppState {
        selected_template_id: wire.t,
        overrides: wire.o,
        last_modified: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LayerOverride, OverrideValue};
    use crate::template::{LayerDefinition, Position, StyleBag, ViewBox};
    use serde_json::json;

    fn template() -> Template {
        let mut style = StyleBag::new();
        style.insert("fontSize".to_string(), json!(24));
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

    fn state_with_override(property: &str, value: serde_json::Value) -> AppState {
        let mut state = AppState::with_template("badge");
        let mut patch = LayerOverride::new();
        patch.insert(property.to_string(), OverrideValue::Set(value));
        state.merge_layer("title", patch);
        state
    }

    #[test]
    fn test_round_trip_equals_canonical_form() {
        let template = template();
        let state = state_with_override("fontSize", json!(40));
        let token = encode(&state, Some(&template)).expect("encode");
        let decoded = decode(&token).expect("decode");
        assert!(decoded.semantic_eq(&state.canonicalize(Some(&template))));
    }

    #[test]
    fn test_encoding_is_deterministic_across_timestamps() {
        let template = template();
        let mut a = state_with_override("fontSize", json!(40));
        let mut b = state_with_override("fontSize", json!(40));
        a.last_modified = 1.0;
        b.last_modified = 99_999.0;
        let ta = encode(&a, Some(&template)).expect("encode a");
        let tb = encode(&b, Some(&template)).expect("encode b");
        assert_eq!(ta, tb);
    }

    #[test]
    fn test_default_equal_override_omitted_from_token() {
        let template = template();
        let state = state_with_override("fontSize", json!(24));
        let token = encode(&state, Some(&template)).expect("encode");
        let decoded = decode(&token).expect("decode");
        assert!(decoded.overrides.is_empty());
    }

    #[test]
    fn test_unknown_override_keys_round_trip() {
        let template = template();
        let state = state_with_override("glowRadius", json!(3.5));
        let token = encode(&state, Some(&template)).expect("encode");
        let decoded = decode(&token).expect("decode");
        assert_eq!(
            decoded.overrides["title"]["glowRadius"],
            OverrideValue::Set(json!(3.5))
        );
    }

    #[test]
    fn test_null_template_id_is_valid() {
        let state = AppState::new();
        let token = encode(&state, None).expect("encode");
        let decoded = decode(&token).expect("decode");
        assert_eq!(decoded.selected_template_id, None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("???invalid"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_as_truncated() {
        assert_eq!(decode(""), Err(DecodeError::Truncated));
        assert_eq!(decode("   "), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_decode_rejects_cut_token_as_truncated() {
        let template = template();
        let state = state_with_override("fontSize", json!(40));
        let token = encode(&state, Some(&template)).expect("encode");
        let cut = &token[..token.len() / 2];
        assert!(matches!(
            decode(cut),
            Err(DecodeError::Truncated | DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let json = br#"{"v":9,"t":"badge","o":{}}"#;
        let token = URL_SAFE_NO_PAD.encode(json);
        assert_eq!(decode(&token), Err(DecodeError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_decode_rejects_missing_template_field() {
        let json = br#"{"v":1,"o":{}}"#;
        let token = URL_SAFE_NO_PAD.encode(json);
        assert!(matches!(decode(&token), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_tolerates_missing_overrides_field() {
        let json = br#"{"v":1,"t":"badge"}"#;
        let token = URL_SAFE_NO_PAD.encode(json);
        let decoded = decode(&token).expect("decode");
        assert!(decoded.overrides.is_empty());
    }
}
