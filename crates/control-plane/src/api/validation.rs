// Input validation for the intake API
//
// Hard limits, not configurable.

/// Maximum prompt size accepted at intake.
pub const MAX_PROMPT_BYTES: usize = 64 * 1024; // 64 KB

/// Maximum context size accepted at intake.
pub const MAX_CONTEXT_BYTES: usize = 256 * 1024; // 256 KB

/// Trim a text field; blank counts as absent
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate the intake fields, collecting every problem.
pub fn validate_intake(
    prompt: Option<&str>,
    context: Option<&str>,
) -> Result<(String, Option<String>), Vec<String>> {
    let mut errors = Vec::new();

    let prompt = trimmed(prompt);
    match &prompt {
        None => errors.push("prompt must not be empty".to_string()),
        Some(p) if p.len() > MAX_PROMPT_BYTES => {
            errors.push(format!("prompt must be at most {MAX_PROMPT_BYTES} bytes"))
        }
        Some(_) => {}
    }

    let context = trimmed(context);
    if context.as_ref().is_some_and(|c| c.len() > MAX_CONTEXT_BYTES) {
        errors.push(format!("context must be at most {MAX_CONTEXT_BYTES} bytes"));
    }

    match prompt {
        Some(prompt) if errors.is_empty() => Ok((prompt, context)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_fields() {
        let (prompt, context) = validate_intake(Some("  hi  "), Some("  ")).unwrap();
        assert_eq!(prompt, "hi");
        assert_eq!(context, None);

        let (_, context) = validate_intake(Some("hi"), Some(" notes ")).unwrap();
        assert_eq!(context.as_deref(), Some("notes"));
    }

    #[test]
    fn test_rejects_blank_prompt() {
        assert_eq!(
            validate_intake(None, None).unwrap_err(),
            vec!["prompt must not be empty"]
        );
        assert!(validate_intake(Some("\n\t"), None).is_err());
    }

    #[test]
    fn test_size_limits() {
        let big = "x".repeat(MAX_PROMPT_BYTES + 1);
        assert!(validate_intake(Some(&big), None).is_err());

        let big_context = "x".repeat(MAX_CONTEXT_BYTES + 1);
        let errors = validate_intake(Some(""), Some(&big_context)).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
