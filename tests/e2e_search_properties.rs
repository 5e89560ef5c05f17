//! Property tests for the search language.

use proptest::prelude::*;

use runlog::search::lexer::{tokenize, tokenize_strict, LexMode};
use runlog::search::{self, parse_with};
use runlog::{Literal, Predicate};

fn field() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["distance", "date", "time", "location", "weather"])
}

fn op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["eq", "ne", "gt", "lt"])
}

fn logical() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["and", "or"])
}

proptest! {
    #[test]
    fn parsing_never_panics(input in ".{0,64}") {
        let _ = search::parse(&input);
        let _ = parse_with(&input, LexMode::Strict);
    }

    #[test]
    fn parsing_never_panics_on_query_shaped_input(input in "[()a-z0-9 '\":.-]{0,48}") {
        let _ = search::parse(&input);
    }

    #[test]
    fn tokens_are_ordered_and_disjoint(input in ".{0,64}") {
        let tokens = tokenize(&input);
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].span.end <= pair[1].span.start);
        }
        for tok in &tokens {
            prop_assert!(tok.span.start < tok.span.end);
            prop_assert!(tok.span.end <= input.len());
        }
    }

    #[test]
    fn strict_lexing_agrees_with_permissive_on_clean_input(
        f in field(), o in op(), n in 0u32..100_000,
    ) {
        let query = format!("({f} {o} {n})");
        prop_assert_eq!(tokenize_strict(&query).unwrap(), tokenize(&query));
    }

    #[test]
    fn keywords_are_case_insensitive(
        f in field(), o in op(), l in logical(), a in 0u32..1000, b in 0u32..1000,
    ) {
        let lower = format!("({f} {o} {a}) {l} ({f} {o} {b})");
        let upper = lower.to_uppercase();
        prop_assert_eq!(search::parse(&upper).unwrap(), search::parse(&lower).unwrap());
    }

    #[test]
    fn numeric_literals_are_floats(f in field(), n in 0u32..1_000_000, frac in 0u32..100) {
        let query = format!("{f} gt {n}.{frac:02}");
        let expected: f64 = format!("{n}.{frac:02}").parse().unwrap();
        match search::parse(&query).unwrap() {
            Predicate::Compare { value: Literal::Number(v), .. } => prop_assert_eq!(v, expected),
            other => prop_assert!(false, "expected a numeric comparison, got {}", other),
        }
    }

    #[test]
    fn chains_fold_left(f in field(), ns in prop::collection::vec(0u32..100, 1..6)) {
        let query = ns
            .iter()
            .map(|n| format!("({f} gt {n})"))
            .collect::<Vec<_>>()
            .join(" or ");
        let expected = ns
            .iter()
            .map(|n| Predicate::gt(f, f64::from(*n)))
            .reduce(Predicate::or)
            .unwrap();
        prop_assert_eq!(search::parse(&query).unwrap(), expected);
    }
}
