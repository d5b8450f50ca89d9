//! Country identifiers and initial letters.
//!
//! Topology documents and the reference dataset do not agree on how ids are
//! written: some carry numeric ids as JSON numbers (`4`), some as strings
//! (`"004"`). Both sides are normalized through [`normalize_country_id`]
//! before they are compared or used as map keys.

/// Normalizes a country id.
///
/// Numeric ids are zero-padded to three digits (ISO 3166 numeric style);
/// anything else is passed through trimmed.
pub fn normalize_country_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>3}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Normalizes an id taken from a JSON value (string or number).
pub fn normalize_json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(normalize_country_id(s)),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|n| normalize_country_id(&n.to_string()))
            .or_else(|| Some(n.to_string())),
        _ => None,
    }
}

/// Returns the lowercase initial a country name is grouped under.
///
/// Names whose first character is not an ASCII letter have no initial and
/// never take part in highlighting or the game.
pub fn initial_of(name: &str) -> Option<char> {
    let first = name.trim().chars().next()?;
    let lower = first.to_lowercase().next()?;
    lower.is_ascii_lowercase().then_some(lower)
}

/// Parses user input as a highlight letter.
///
/// Only a single lowercase ASCII letter is accepted.
pub fn parse_initial(input: &str) -> Option<char> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_are_padded() {
        assert_eq!(normalize_country_id("4"), "004");
        assert_eq!(normalize_country_id("076"), "076");
        assert_eq!(normalize_country_id(" 840 "), "840");
        assert_eq!(normalize_country_id("1234"), "1234");
    }

    #[test]
    fn test_non_numeric_ids_pass_through() {
        assert_eq!(normalize_country_id("XKX"), "XKX");
        assert_eq!(normalize_country_id("-99"), "-99");
    }

    #[test]
    fn test_json_ids() {
        assert_eq!(
            normalize_json_id(&serde_json::json!(8)),
            Some("008".to_string())
        );
        assert_eq!(
            normalize_json_id(&serde_json::json!("36")),
            Some("036".to_string())
        );
        assert_eq!(normalize_json_id(&serde_json::json!(null)), None);
        assert_eq!(normalize_json_id(&serde_json::json!("")), None);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initial_of("France"), Some('f'));
        assert_eq!(initial_of("  eSwatini"), Some('e'));
        assert_eq!(initial_of("Åland"), None);
        assert_eq!(initial_of(""), None);
    }

    #[test]
    fn test_parse_initial_rejects_everything_but_one_lowercase_letter() {
        assert_eq!(parse_initial("a"), Some('a'));
        assert_eq!(parse_initial("A"), None);
        assert_eq!(parse_initial("ab"), None);
        assert_eq!(parse_initial("1"), None);
        assert_eq!(parse_initial(""), None);
    }
}
