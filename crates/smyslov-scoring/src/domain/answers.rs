//! Answer parsing and normalization.

/// Maximum number of answers a player may submit per round.
pub const MAX_ANSWERS: usize = 6;

/// Splits a free-form message into answers.
///
/// Newlines, commas and semicolons all separate answers. Blank entries are
/// dropped and only the first `max` are kept. Case is preserved; comparison
/// happens on [`normalize`]d values.
#[must_use]
pub fn parse_answers(raw: &str, max: usize) -> Vec<String> {
    raw.split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|answer| !answer.is_empty())
        .take(max)
        .map(str::to_owned)
        .collect()
}

/// Canonical form used when comparing answers.
#[must_use]
pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answers_accepts_mixed_separators() {
        let answers = parse_answers("cat, dog;sun\n moon ", MAX_ANSWERS);

        assert_eq!(answers, vec!["cat", "dog", "sun", "moon"]);
    }

    #[test]
    fn test_parse_answers_drops_blanks_and_truncates() {
        let answers = parse_answers("a,,b,\n,c,d,e,f,g,h", MAX_ANSWERS);

        assert_eq!(answers, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_parse_answers_blank_message_is_empty() {
        assert!(parse_answers(" ,; \n", MAX_ANSWERS).is_empty());
    }

    #[test]
    fn test_normalize_folds_case_and_whitespace() {
        assert_eq!(normalize("  Кошка "), "кошка");
        assert_eq!(normalize("CAT"), "cat");
    }
}
