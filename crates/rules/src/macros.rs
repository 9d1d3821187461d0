//! The [`validator!`] macro.
//!
//! ```rust,ignore
//! use fieldwise_rules::validator;
//! use fieldwise_rules::foundation::RuleFailure;
//!
//! validator! {
//!     pub NotBlank for str;
//!     rule(input) { !input.trim().is_empty() }
//!     error(input) { RuleFailure::new("not_blank", "'{PropertyName}' must not be blank.") }
//!     fn not_blank();
//! }
//! ```

/// Declares a property check: the struct, its
/// [`Validate`](crate::foundation::Validate) impl and a factory function.
///
/// Three shapes are accepted. A unit check (`pub NotEmpty for str;`) is a
/// zero-sized `Copy` type. A check with fields (`pub MaxLength { max: usize }
/// for str;`) gets `#[derive(Debug, Clone)]` and a `new` taking every field
/// in order. A generic check (`pub Above<T: PartialOrd + Display> { bound: T }
/// for T;`) is the same with one type parameter whose bounds are plain
/// paths in scope. Extra derives go in a leading `#[derive(...)]`.
///
/// `rule` must evaluate to `true` when the input passes; `error` builds the
/// [`RuleFailure`](crate::foundation::RuleFailure) otherwise.
#[macro_export]
macro_rules! validator {
    (@validate [$($generics:tt)*] $ty:ty, $input:ty, $this:ident,
        $inp:ident => $rule:block, $einp:ident => $err:block) => {
        impl<$($generics)*> $crate::foundation::Validate for $ty {
            type Input = $input;

            #[allow(unused_variables)]
            fn validate(
                &$this,
                $inp: &Self::Input,
            ) -> ::std::result::Result<(), $crate::foundation::RuleFailure> {
                if $rule {
                    return Ok(());
                }
                let $einp = $inp;
                Err($err)
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident for $input:ty;
        rule($inp:ident) $rule:block
        error($einp:ident) $err:block
        fn $factory:ident();
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name;

        $crate::validator!(@validate [] $name, $input, self, $inp => $rule, $einp => $err);

        #[doc = concat!("Creates a [`", stringify!($name), "`] check.")]
        #[must_use]
        $vis const fn $factory() -> $name {
            $name
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident { $($field:ident: $fty:ty),+ $(,)? } for $input:ty;
        rule($this:ident, $inp:ident) $rule:block
        error($_this:ident, $einp:ident) $err:block
        fn $factory:ident($($arg:ident: $aty:ty),* $(,)?);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            $(pub $field: $fty,)+
        }

        impl $name {
            /// Builds the check from its fields.
            #[must_use]
            pub fn new($($field: $fty),+) -> Self {
                Self { $($field),+ }
            }
        }

        $crate::validator!(@validate [] $name, $input, $this, $inp => $rule, $einp => $err);

        #[doc = concat!("Creates a [`", stringify!($name), "`] check.")]
        #[must_use]
        $vis fn $factory($($arg: $aty),*) -> $name {
            $name::new($($arg),*)
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident<$param:ident: $bound:ident $(+ $more:ident)*>
            { $($field:ident: $fty:ty),+ $(,)? } for $input:ty;
        rule($this:ident, $inp:ident) $rule:block
        error($_this:ident, $einp:ident) $err:block
        fn $factory:ident($($arg:ident: $aty:ty),* $(,)?);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name<$param> {
            $(pub $field: $fty,)+
        }

        impl<$param: $bound $(+ $more)*> $name<$param> {
            /// Builds the check from its fields.
            #[must_use]
            pub fn new($($field: $fty),+) -> Self {
                Self { $($field),+ }
            }
        }

        $crate::validator!(
            @validate [$param: $bound $(+ $more)*] $name<$param>, $input, $this,
            $inp => $rule, $einp => $err
        );

        #[doc = concat!("Creates a [`", stringify!($name), "`] check.")]
        #[must_use]
        $vis fn $factory<$param: $bound $(+ $more)*>($($arg: $aty),*) -> $name<$param> {
            $name::new($($arg),*)
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::foundation::{RuleFailure, Validate};
    use std::fmt::Display;

    crate::validator! {
        Lowercase for str;
        rule(input) { input.chars().all(|c| !c.is_uppercase()) }
        error(input) { RuleFailure::new("lowercase", "'{PropertyName}' must be lowercase.") }
        fn lowercase();
    }

    crate::validator! {
        #[derive(Copy, PartialEq, Eq)]
        StartsWith { prefix: char } for str;
        rule(self, input) { input.starts_with(self.prefix) }
        error(self, input) {
            RuleFailure::new("starts_with", "'{PropertyName}' must start with {Prefix}.")
                .with_param("Prefix", self.prefix)
        }
        fn starts_with(prefix: char);
    }

    crate::validator! {
        Above<T: PartialOrd + Display + Copy> { bound: T } for T;
        rule(self, input) { *input > self.bound }
        error(self, input) {
            RuleFailure::new("above", "'{PropertyName}' must be above {Bound}.")
                .with_param("Bound", self.bound)
        }
        fn above(bound: T);
    }

    #[test]
    fn unit_check() {
        assert!(lowercase().validate("abc").is_ok());
        assert_eq!(lowercase().validate("aBc").unwrap_err().code, "lowercase");
    }

    #[test]
    fn check_with_fields() {
        let v = starts_with('#');
        assert!(v.validate("#tag").is_ok());
        let failure = v.validate("tag").unwrap_err();
        assert_eq!(failure.render("Label"), "'Label' must start with #.");
        assert_eq!(v, StartsWith::new('#'));
    }

    #[test]
    fn generic_check() {
        assert!(above(3).validate(&4).is_ok());
        assert_eq!(
            above(3.5).validate(&1.0).unwrap_err().render("Price"),
            "'Price' must be above 3.5."
        );
    }
}
