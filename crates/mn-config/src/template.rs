//! Explicit string-template substitution.
//!
//! The authoring template marks substitution points with `{}` (a single
//! positional marker) or `{key}` (named placeholders). Both directions of
//! mismatch are configuration-authoring defects and fail resolution: a
//! template missing an expected placeholder, and a placeholder left unfilled
//! after substitution.

use mn_types::TemplateError;

/// Substitute the single positional `{}` marker with `value`.
pub fn fill_marker(template: &str, value: &str) -> Result<String, TemplateError> {
    if !template.contains("{}") {
        return Err(TemplateError::MissingPlaceholder {
            template: template.to_string(),
            key: "{}".to_string(),
        });
    }
    let filled = template.replacen("{}", value, 1);
    ensure_no_leftover(template, &filled)?;
    Ok(filled)
}

/// Substitute every `{key}` placeholder from `pairs`.
///
/// Each supplied key must occur in the template, and no placeholder may
/// remain once all pairs are applied.
pub fn fill_named(template: &str, pairs: &[(&str, String)]) -> Result<String, TemplateError> {
    let mut filled = template.to_string();
    for (key, value) in pairs {
        let needle = format!("{{{key}}}");
        if !filled.contains(&needle) {
            return Err(TemplateError::MissingPlaceholder {
                template: template.to_string(),
                key: needle,
            });
        }
        filled = filled.replace(&needle, value);
    }
    ensure_no_leftover(template, &filled)?;
    Ok(filled)
}

fn ensure_no_leftover(template: &str, filled: &str) -> Result<(), TemplateError> {
    if let Some(start) = filled.find('{') {
        let end = filled[start..]
            .find('}')
            .map(|e| start + e + 1)
            .unwrap_or(filled.len());
        return Err(TemplateError::UnfilledPlaceholder {
            template: template.to_string(),
            key: filled[start..end].to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_substitution() {
        assert_eq!(fill_marker("natsbench{}", "MD").unwrap(), "natsbenchMD");
        assert_eq!(fill_marker("natsbench{}", "").unwrap(), "natsbench");
    }

    #[test]
    fn marker_missing_is_fatal() {
        let err = fill_marker("natsbench", "MD").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { .. }));
    }

    #[test]
    fn marker_left_unfilled_is_fatal() {
        let err = fill_marker("natsbench{}{}", "MD").unwrap_err();
        assert!(matches!(err, TemplateError::UnfilledPlaceholder { .. }));
    }

    #[test]
    fn named_substitution() {
        let filled = fill_named(
            "pf/{search_space}-{hp}.json",
            &[
                ("search_space", "sss".to_string()),
                ("hp", "90".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(filled, "pf/sss-90.json");
    }

    #[test]
    fn named_missing_key_is_fatal() {
        let err = fill_named("pf/{search_space}.json", &[("hp", "90".to_string())]).unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { .. }));
    }

    #[test]
    fn named_unfilled_key_is_fatal() {
        let err = fill_named(
            "pf/{search_space}-{hp}.json",
            &[("search_space", "sss".to_string())],
        )
        .unwrap_err();
        match err {
            TemplateError::UnfilledPlaceholder { key, .. } => assert_eq!(key, "{hp}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
