//! Text validators.
//!
//! Lengths are measured in Unicode scalar values (chars), not bytes.

use crate::foundation::RuleFailure;

crate::validator! {
    /// The text must contain something other than whitespace.
    pub NotEmpty for str;
    rule(input) { !input.trim().is_empty() }
    error(input) { RuleFailure::new("not_empty", "'{PropertyName}' must not be empty.") }
    fn not_empty();
}

crate::validator! {
    /// The text must be at least `min` chars long.
    #[derive(Copy, PartialEq, Eq, Hash)]
    pub MinLength { min: usize } for str;
    rule(self, input) { input.chars().count() >= self.min }
    error(self, input) {
        RuleFailure::new(
            "min_length",
            "The length of '{PropertyName}' must be at least {MinLength} characters. \
             You entered {TotalLength} characters.",
        )
        .with_param("MinLength", self.min)
        .with_param("TotalLength", input.chars().count())
    }
    fn min_length(min: usize);
}

crate::validator! {
    /// The text must be at most `max` chars long.
    #[derive(Copy, PartialEq, Eq, Hash)]
    pub MaxLength { max: usize } for str;
    rule(self, input) { input.chars().count() <= self.max }
    error(self, input) {
        RuleFailure::new(
            "max_length",
            "The length of '{PropertyName}' must be {MaxLength} characters or fewer. \
             You entered {TotalLength} characters.",
        )
        .with_param("MaxLength", self.max)
        .with_param("TotalLength", input.chars().count())
    }
    fn max_length(max: usize);
}
