use crate::config::PipelineConfig;
use crate::text::contains_japanese;
use crate::validation::ValidationResult;

/// Warn when `text` exceeds the cap configured for `field`.
///
/// Length is counted in characters. Texts with any Japanese script use the
/// tighter Japanese cap.
pub fn check_narrative(
    field: &str,
    path: &str,
    text: &str,
    config: &PipelineConfig,
    result: &mut ValidationResult,
) {
    let limit = config.narrative_limit(field);
    let (cap, script) = if contains_japanese(text) {
        (limit.japanese, "Japanese")
    } else {
        (limit.latin, "Latin")
    };

    let length = text.chars().count();
    if length > cap {
        result.warning(format!(
            "{}: narrative is {} characters, over the {} character limit for {} text",
            path, length, cap, script
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_text_gets_tighter_cap() {
        let config = PipelineConfig::default();
        let mut result = ValidationResult::new();

        check_narrative("reason", "referral.reason", &"a".repeat(600), &config, &mut result);
        assert!(result.warnings().is_empty());

        check_narrative("reason", "referral.reason", &"腹".repeat(600), &config, &mut result);
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("500"));
        assert!(result.is_valid());
    }

    #[test]
    fn test_exact_cap_is_allowed() {
        let config = PipelineConfig::default();
        let mut result = ValidationResult::new();
        check_narrative("reason", "r", &"x".repeat(1000), &config, &mut result);
        assert!(result.warnings().is_empty());
        check_narrative("reason", "r", &"x".repeat(1001), &config, &mut result);
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_mixed_script_counts_as_japanese() {
        let config = PipelineConfig::default();
        let mut result = ValidationResult::new();
        let text = format!("{}痛", "a".repeat(500));
        check_narrative("reason", "r", &text, &config, &mut result);
        assert_eq!(result.warnings().len(), 1);
    }
}
