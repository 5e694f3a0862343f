//! Internal testing utilities for the ngc crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

/// Utility for writing parametrized (aka. table-driven) tests.
///
/// To create a table-driven test:
///
/// 1. Import the `TestCases` trait
/// 2. Define a struct, conventionally named `Case`, holding the data for a
///    single test case. It must implement `Debug`.
/// 3. Build a collection of `Case` instances (an array or Vec), conventionally
///    named `cases`.
/// 4. Call `cases.test_each` with the test body as a closure.
///
/// `test_each` runs every case, catching panics. If all cases pass it
/// returns. Otherwise it panics with the debug representations of the
/// failing cases, so a single run reports every failure in the table.
///
/// ## Example
///
/// ```
/// use ngc_testing::TestCases;
///
/// // Add #[test] attribute
/// fn test_add() {
///   #[derive(Debug)]
///   struct Case {
///     a: i32,
///     b: i32,
///     expected: i32,
///   }
///
///   let cases = [
///     Case { a: 3, b: 5, expected: 8 },
///   ];
///
///   cases.test_each(|&Case { a, b, expected }| {
///     assert_eq!(a + b, expected);
///   });
/// }
/// # test_add();
/// ```
///
/// Cases and the test closure must be [unwind
/// safe](https://doc.rust-lang.org/std/panic/fn.catch_unwind.html). In
/// practice this means case fields and captured values must not contain
/// interior mutability; values created inside the closure may.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Run `test` against each case in `self`, catching panics.
    ///
    /// Returns if every case passed, panics with the failing cases otherwise.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes a clone of
    /// each case to the test function rather than a reference.
    ///
    /// Useful when the test body wants to consume the case, at the cost of a
    /// clone per case.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            if std::panic::catch_unwind(|| test(&case)).is_err() {
                failures.push(case);
            }
        }
        assert!(
            failures.is_empty(),
            "{} test cases failed: {:?}",
            failures.len(),
            failures
        );
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            let result = std::panic::catch_unwind({
                let case_clone = case.clone();
                let test = &test;
                move || test(case_clone)
            });
            if result.is_err() {
                failures.push(case);
            }
        }
        assert!(
            failures.is_empty(),
            "{} test cases failed: {:?}",
            failures.len(),
            failures
        );
    }
}
