//! Schema-driven validation of user-configurable preferences.
//!
//! Each settings section (marker, save location, voice, text, transcription)
//! carries a table of per-field rules. A failing rule that declares a
//! sanitizer substitutes the corrected value and records a warning; only
//! rules without a sanitizer (structural checks) produce hard errors. The
//! net effect is best-effort correction: broken settings are clamped or
//! defaulted, not rejected.

use serde_json::{Value, json};

use crate::compositor::{MarkerShape, MarkerStyle, parse_hex_color};

/// Recognized voice-input languages
const VOICE_LANGUAGES: &[&str] = &["en-US", "en-GB", "de-DE", "fr-FR", "es-ES", "ja-JP"];

/// Recognized transcription providers
const TRANSCRIPTION_PROVIDERS: &[&str] = &["platform", "none"];

/// Border styles accepted for the marker
const MARKER_STYLES: &[&str] = &["solid", "dashed", "dotted"];

type Check = fn(&Value) -> bool;
type Sanitize = fn(&Value) -> Value;

/// One field rule: a predicate plus an optional corrective sanitizer
struct FieldRule {
    field: &'static str,
    message: &'static str,
    check: Check,
    sanitize: Option<Sanitize>,
}

/// Outcome of validating a settings document
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// False only when a sanitizer-less rule failed
    pub is_valid: bool,
    /// Hard failures (no sanitizer available)
    pub errors: Vec<String>,
    /// Fields that were corrected in `sanitized`
    pub warnings: Vec<String>,
    /// The input with every correctable field replaced
    pub sanitized: Value,
}

/// Validate and sanitize a settings document.
///
/// Unknown sections and fields pass through untouched; absent fields are
/// left absent (defaults apply at resolution time, not here).
pub fn validate(input: &Value) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(_) = input.as_object() else {
        return ValidationReport {
            is_valid: false,
            errors: vec!["settings must be an object".to_string()],
            warnings,
            sanitized: json!({}),
        };
    };
    let mut sanitized = input.clone();

    for (section, rules) in schema() {
        let Some(section_value) = sanitized.get_mut(section) else {
            continue;
        };
        if !section_value.is_object() {
            errors.push(format!("{}: section must be an object", section));
            continue;
        }
        for rule in rules {
            let Some(field_value) = section_value.get(rule.field) else {
                continue;
            };
            if (rule.check)(field_value) {
                continue;
            }
            match rule.sanitize {
                Some(sanitize) => {
                    let corrected = sanitize(field_value);
                    warnings.push(format!("{}.{}: {}", section, rule.field, rule.message));
                    section_value[rule.field] = corrected;
                }
                None => {
                    errors.push(format!("{}.{}: {}", section, rule.field, rule.message));
                }
            }
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        sanitized,
    }
}

/// Resolve the effective marker style from an optional settings document.
///
/// Absent settings, a missing marker section, or any per-field problem all
/// fall back to the documented defaults, field by field.
pub fn resolve_marker_style(settings: Option<&Value>) -> MarkerStyle {
    let defaults = MarkerStyle::default();
    let Some(settings) = settings else {
        return defaults;
    };
    let report = validate(settings);
    let Some(marker) = report.sanitized.get("marker") else {
        return defaults;
    };

    let color = marker
        .get("color")
        .and_then(Value::as_str)
        .filter(|c| parse_hex_color(c).is_some())
        .map(str::to_string)
        .unwrap_or(defaults.color);
    let opacity = marker
        .get("opacity")
        .and_then(Value::as_f64)
        .map(|o| o.clamp(0.0, 1.0))
        .unwrap_or(defaults.opacity);
    let size = marker
        .get("size")
        .and_then(Value::as_f64)
        .filter(|s| *s > 0.0)
        .unwrap_or(defaults.size);
    let style = marker
        .get("style")
        .and_then(Value::as_str)
        .and_then(|s| match s {
            "solid" => Some(MarkerShape::Solid),
            "dashed" => Some(MarkerShape::Dashed),
            "dotted" => Some(MarkerShape::Dotted),
            _ => None,
        })
        .unwrap_or(defaults.style);

    MarkerStyle {
        color,
        opacity,
        size,
        style,
    }
}

/// The per-section rule tables
fn schema() -> Vec<(&'static str, Vec<FieldRule>)> {
    vec![
        (
            "marker",
            vec![
                FieldRule {
                    field: "color",
                    message: "not a #rrggbb color, reset to default",
                    check: |v| v.as_str().is_some_and(|s| parse_hex_color(s).is_some()),
                    sanitize: Some(|_| json!(MarkerStyle::default().color)),
                },
                FieldRule {
                    field: "opacity",
                    message: "outside 0..=1, clamped",
                    check: |v| v.as_f64().is_some_and(|o| (0.0..=1.0).contains(&o)),
                    sanitize: Some(|v| json!(v.as_f64().unwrap_or(1.0).clamp(0.0, 1.0))),
                },
                FieldRule {
                    field: "size",
                    message: "not a positive number, reset to default",
                    check: |v| v.as_f64().is_some_and(|s| s > 0.0),
                    sanitize: Some(|_| json!(MarkerStyle::default().size)),
                },
                FieldRule {
                    field: "style",
                    message: "unknown style, reset to solid",
                    check: |v| v.as_str().is_some_and(|s| MARKER_STYLES.contains(&s)),
                    sanitize: Some(|_| json!("solid")),
                },
            ],
        ),
        (
            "saveLocation",
            vec![FieldRule {
                field: "folder",
                message: "not filesystem-safe, sanitized",
                check: |v| {
                    v.as_str().is_some_and(|s| {
                        !s.is_empty()
                            && s.chars()
                                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
                    })
                },
                sanitize: Some(|v| {
                    let cleaned: String = v
                        .as_str()
                        .unwrap_or("captures")
                        .chars()
                        .map(|c| {
                            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/') {
                                c
                            } else {
                                '_'
                            }
                        })
                        .collect();
                    if cleaned.is_empty() {
                        json!("captures")
                    } else {
                        json!(cleaned)
                    }
                }),
            }],
        ),
        (
            "voice",
            vec![
                FieldRule {
                    field: "enabled",
                    message: "not a boolean, disabled",
                    check: Value::is_boolean,
                    sanitize: Some(|_| json!(false)),
                },
                FieldRule {
                    field: "language",
                    message: "unsupported language, reset to en-US",
                    check: |v| v.as_str().is_some_and(|s| VOICE_LANGUAGES.contains(&s)),
                    sanitize: Some(|_| json!("en-US")),
                },
            ],
        ),
        (
            "text",
            vec![
                FieldRule {
                    field: "enabled",
                    message: "not a boolean, enabled",
                    check: Value::is_boolean,
                    sanitize: Some(|_| json!(true)),
                },
                FieldRule {
                    field: "maxLength",
                    message: "outside 1..=2000, clamped",
                    check: |v| v.as_i64().is_some_and(|n| (1..=2000).contains(&n)),
                    sanitize: Some(|v| json!(v.as_i64().unwrap_or(500).clamp(1, 2000))),
                },
            ],
        ),
        (
            "transcription",
            vec![
                FieldRule {
                    field: "provider",
                    message: "unknown provider, reset to platform",
                    check: |v| {
                        v.as_str()
                            .is_some_and(|s| TRANSCRIPTION_PROVIDERS.contains(&s))
                    },
                    sanitize: Some(|_| json!("platform")),
                },
                // Structural: a key of the wrong type cannot be corrected
                FieldRule {
                    field: "apiKey",
                    message: "must be a string",
                    check: Value::is_string,
                    sanitize: None,
                },
            ],
        ),
    ]
}
