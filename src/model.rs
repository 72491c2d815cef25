//! Model name resolution.

/// Short name aliases for Gemini image models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", "gemini-2.5-flash-image-preview"),
    ("nano-banana-2", "gemini-3.1-flash-image-preview"),
    ("nano-banana-pro", "gemini-3-pro-image-preview"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map_or_else(|| name.to_string(), |&(_, full)| full.to_string())
}

/// Check that a resolved model is served by the Gemini API.
///
/// # Errors
///
/// Returns an error if the model name is not a `gemini-*` model.
pub fn validate_model(model: &str) -> Result<(), String> {
    if model.starts_with("gemini") {
        Ok(())
    } else {
        Err(format!("Unsupported model '{model}'. Expected a 'gemini-*' image model or an alias."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_aliases() {
        assert_eq!(resolve_model("nano-banana"), "gemini-2.5-flash-image-preview");
        assert_eq!(resolve_model("nano-banana-2"), "gemini-3.1-flash-image-preview");
        assert_eq!(resolve_model("nano-banana-pro"), "gemini-3-pro-image-preview");
    }

    #[test]
    fn resolve_exact_name_passthrough() {
        assert_eq!(resolve_model("gemini-2.5-flash-image"), "gemini-2.5-flash-image");
    }

    #[test]
    fn validate_gemini_models() {
        assert!(validate_model("gemini-2.5-flash-image-preview").is_ok());
        assert!(validate_model(&resolve_model("nano-banana-pro")).is_ok());
    }

    #[test]
    fn reject_other_models() {
        assert!(validate_model("gpt-image-1").is_err());
        assert!(validate_model("dall-e-3").is_err());
    }
}
