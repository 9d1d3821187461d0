//! Range validators.

use std::fmt::Display;

use crate::foundation::RuleFailure;

crate::validator! {
    /// The value must lie strictly between `from` and `to`.
    #[derive(Copy, PartialEq, Eq, Hash)]
    pub ExclusiveBetween<T: PartialOrd + Display + Copy> { from: T, to: T } for T;
    rule(self, input) { *input > self.from && *input < self.to }
    error(self, input) {
        RuleFailure::new(
            "exclusive_between",
            "'{PropertyName}' must be between {From} and {To} (exclusive). You entered {PropertyValue}.",
        )
        .with_param("From", self.from)
        .with_param("To", self.to)
        .with_param("PropertyValue", input)
    }
    fn exclusive_between(from: T, to: T);
}

crate::validator! {
    /// The value must lie between `from` and `to`, bounds included.
    #[derive(Copy, PartialEq, Eq, Hash)]
    pub InclusiveBetween<T: PartialOrd + Display + Copy> { from: T, to: T } for T;
    rule(self, input) { *input >= self.from && *input <= self.to }
    error(self, input) {
        RuleFailure::new(
            "inclusive_between",
            "'{PropertyName}' must be between {From} and {To}. You entered {PropertyValue}.",
        )
        .with_param("From", self.from)
        .with_param("To", self.to)
        .with_param("PropertyValue", input)
    }
    fn inclusive_between(from: T, to: T);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Validate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, false)]
    #[case(2, true)]
    #[case(11, true)]
    #[case(12, false)]
    #[case(15, false)]
    fn exclusive_bounds(#[case] grade: i32, #[case] ok: bool) {
        assert_eq!(exclusive_between(1, 12).validate(&grade).is_ok(), ok);
    }

    #[rstest]
    #[case(1, true)]
    #[case(12, true)]
    #[case(0, false)]
    fn inclusive_bounds(#[case] grade: i32, #[case] ok: bool) {
        assert_eq!(inclusive_between(1, 12).validate(&grade).is_ok(), ok);
    }

    #[test]
    fn exclusive_message() {
        let failure = exclusive_between(1, 12).validate(&15).unwrap_err();
        assert_eq!(
            failure.render("Grade"),
            "'Grade' must be between 1 and 12 (exclusive). You entered 15."
        );
    }

    proptest! {
        #[test]
        fn exclusive_is_inclusive_minus_bounds(
            from in -100i64..100,
            span in 0i64..50,
            x in -200i64..200,
        ) {
            let to = from + span;
            let exclusive = exclusive_between(from, to).validate(&x).is_ok();
            let inclusive = inclusive_between(from, to).validate(&x).is_ok();
            prop_assert_eq!(exclusive, inclusive && x != from && x != to);
        }
    }
}
