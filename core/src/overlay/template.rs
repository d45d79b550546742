//! Template-expression substitution
//!
//! Overlay text content and image paths may embed `{{property.path}}`
//! expressions resolved against live token/actor data at resolution time.
//! Unresolvable paths substitute as empty text.

use std::sync::LazyLock;

use regex::Regex;

use effigy_types::OverlayConfig;

use crate::host::TokenState;

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// Substitute every `{{path}}` occurrence in `input`
pub fn interpolate(input: &str, token: &dyn TokenState) -> String {
    if !input.contains("{{") {
        return input.to_string();
    }
    TEMPLATE_RE
        .replace_all(input, |caps: &regex::Captures| {
            let path = caps[1].trim();
            token
                .resolve_property(path)
                .map(|value| value.display())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Expand an authored overlay config into its resolved form
pub fn expand(config: &OverlayConfig, token: &dyn TokenState) -> OverlayConfig {
    let mut out = config.clone();
    if let Some(img) = &mut out.img {
        *img = interpolate(img, token);
    }
    if let Some(text) = &mut out.text {
        text.text = interpolate(&text.text, token);
    }
    out
}
