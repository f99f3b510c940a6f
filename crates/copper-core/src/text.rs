/// "a", "a or b", "a, b, or c".
pub fn human_readable_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [first, second] => format!("{} or {}", first.as_ref(), second.as_ref()),
        [rest @ .., last] => {
            let head = rest
                .iter()
                .map(|item| item.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{head}, or {}", last.as_ref())
        }
    }
}

/// "lOST" -> "Lost".
pub fn initial_capital(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Comparison key for user-typed names: no whitespace, lowercase.
pub fn strip_and_lowercase(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive equality under full Unicode lowercasing.
pub fn same_ignoring_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_list_uses_oxford_or() {
        assert_eq!(human_readable_list::<&str>(&[]), "");
        assert_eq!(human_readable_list(&["Open"]), "Open");
        assert_eq!(human_readable_list(&["Open", "Won"]), "Open or Won");
        assert_eq!(
            human_readable_list(&["Open", "Won", "Lost", "Abandoned"]),
            "Open, Won, Lost, or Abandoned"
        );
    }

    #[test]
    fn initial_capital_normalizes_case() {
        assert_eq!(initial_capital("lOST"), "Lost");
        assert_eq!(initial_capital(""), "");
    }

    #[test]
    fn strip_and_lowercase_ignores_spacing() {
        assert_eq!(strip_and_lowercase(" Renewal  Date "), "renewaldate");
    }

    #[test]
    fn same_ignoring_case_handles_non_ascii_names() {
        assert!(same_ignoring_case("ÉTUDE", "étude"));
        assert!(same_ignoring_case("Price", "pRICE"));
        assert!(!same_ignoring_case("Price", "Prices"));
    }
}
