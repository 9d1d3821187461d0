//! Display names for properties.

/// Splits a PascalCase property name into words (`FirstName` → `First Name`).
///
/// Acronyms stay together (`HTTPServer` → `HTTP Server`); digits do not
/// start a new word (`Address1` → `Address1`).
pub fn display_name(property: &str) -> String {
    let chars: Vec<char> = property.chars().collect();
    let mut out = String::with_capacity(property.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("FirstName", "First Name")]
    #[case("Grade", "Grade")]
    #[case("Line1", "Line1")]
    #[case("Address1Line", "Address1 Line")]
    #[case("HTTPServer", "HTTP Server")]
    #[case("postCode", "post Code")]
    #[case("", "")]
    fn splits_pascal_case(#[case] property: &str, #[case] expected: &str) {
        assert_eq!(display_name(property), expected);
    }
}
