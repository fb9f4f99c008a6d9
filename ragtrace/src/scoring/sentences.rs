/// Split response text into claim sentences.
///
/// Splits on every `.`, trims each fragment and drops empty ones. No
/// abbreviation or decimal handling: `"3.5 kg."` yields `["3", "5 kg"]`.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_split() {
        assert_eq!(
            split_sentences("Paris is in France. It has the Eiffel Tower."),
            vec!["Paris is in France", "It has the Eiffel Tower"]
        );
    }

    #[test]
    fn test_empty_fragments_dropped() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" ... ").is_empty());
        assert_eq!(split_sentences("One..Two. "), vec!["One", "Two"]);
    }

    #[test]
    fn test_no_trailing_period() {
        assert_eq!(split_sentences("no period here"), vec!["no period here"]);
    }

    #[test]
    fn test_decimals_are_split() {
        assert_eq!(split_sentences("It weighs 3.5 kg."), vec!["It weighs 3", "5 kg"]);
    }

    #[test]
    fn test_idempotent() {
        let text = "A. B c.  D  .";
        let once = split_sentences(text);
        let twice: Vec<String> = once.iter().flat_map(|s| split_sentences(s)).collect();
        assert_eq!(once, twice);
        assert_eq!(once, split_sentences(text));
    }
}
