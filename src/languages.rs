use anyhow::{Result, anyhow};

/// Target languages offered by the settings form, in display order.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Chinese (Simplified)"),
    ("ja", "Japanese"),
    ("ru", "Russian"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("hi", "Hindi"),
    ("ar", "Arabic"),
    ("sv", "Swedish"),
];

pub const DEFAULT_TARGET_LANGUAGE: &str = "es";

pub fn display_name(code: &str) -> Option<&'static str> {
    let code = normalize_code(code);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}

/// Accepts any 2-3 letter ASCII code, not only the ones in the table; the
/// provider is told the code verbatim.
pub fn validate_code(code: &str) -> Result<String> {
    let normalized = normalize_code(code);
    let valid = matches!(normalized.len(), 2 | 3)
        && normalized.chars().all(|ch| ch.is_ascii_lowercase());
    if !valid {
        return Err(anyhow!(
            "invalid target language code '{}' (expected a 2-3 letter ISO 639 code)",
            code
        ));
    }
    Ok(normalized)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
