//! Property-based tests using proptest.
//!
//! Verifies idempotency-token invariants, collector limit arithmetic over
//! arbitrary listing sizes, and last-write-wins answer flattening.

use std::collections::HashMap;

use proptest::prelude::*;

use mturkish::answer::flatten_answer;
use mturkish::collector::{Collector, Listing, PAGE_SIZE};
use mturkish::model::Hit;
use mturkish::service::InMemoryTaskService;
use mturkish::token::unique_request_token;

// ─── Arbitrary Strategies ───────────────────────────────────────────────────

fn arb_id() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,30}"
}

fn arb_line() -> impl Strategy<Value = String> {
    "\\{\"[a-z]{1,8}\": ?\"[a-zA-Z0-9 ]{0,20}\"\\}"
}

fn arb_answers() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-c]{1,2}", "[a-z0-9]{0,10}"), 0..12)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

// ─── Token Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn token_is_64_lowercase_hex(
        hit_type in arb_id(),
        layout in arb_id(),
        annotation in proptest::option::of("[a-z0-9-]{0,20}"),
        line in arb_line(),
    ) {
        let token = unique_request_token(&hit_type, &layout, annotation.as_deref(), &line);
        prop_assert_eq!(token.len(), 64);
        prop_assert!(token.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn token_is_deterministic(
        hit_type in arb_id(),
        layout in arb_id(),
        annotation in proptest::option::of("[a-z0-9-]{0,20}"),
        line in arb_line(),
    ) {
        prop_assert_eq!(
            unique_request_token(&hit_type, &layout, annotation.as_deref(), &line),
            unique_request_token(&hit_type, &layout, annotation.as_deref(), &line)
        );
    }

    #[test]
    fn distinct_lines_give_distinct_tokens(
        hit_type in arb_id(),
        layout in arb_id(),
        a in arb_line(),
        b in arb_line(),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(
            unique_request_token(&hit_type, &layout, Some("batch"), &a),
            unique_request_token(&hit_type, &layout, Some("batch"), &b)
        );
    }

    #[test]
    fn missing_annotation_hashes_like_empty(
        hit_type in arb_id(),
        layout in arb_id(),
        line in arb_line(),
    ) {
        prop_assert_eq!(
            unique_request_token(&hit_type, &layout, None, &line),
            unique_request_token(&hit_type, &layout, Some(""), &line)
        );
    }
}

// ─── Collector Properties ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn collected_length_is_min_of_bounds(
        total in 0usize..130,
        limit in proptest::option::of(0usize..90),
        max_items in 1usize..150,
    ) {
        let service = InMemoryTaskService::new().with_hits((0..total).map(|i| Hit {
            hit_id: format!("H{i}"),
            ..Hit::default()
        }));

        let items = block_on(Collector::new(max_items).collect(&service, &Listing::Hits, limit, None))
            .unwrap();

        let expected = total.min(max_items).min(limit.unwrap_or(usize::MAX));
        prop_assert_eq!(items.len(), expected);

        // Never more pages than needed to cover the raw items consumed.
        let pages_needed = total.min(max_items).div_ceil(PAGE_SIZE).max(1);
        prop_assert!(service.listing_calls() <= pages_needed);
    }
}

// ─── Answer Properties ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn flattening_keeps_last_answer_per_question(answers in arb_answers()) {
        let body: String = answers
            .iter()
            .map(|(q, a)| {
                format!("<Answer><QuestionIdentifier>{q}</QuestionIdentifier><FreeText>{a}</FreeText></Answer>")
            })
            .collect();
        let xml = format!("<QuestionFormAnswers>{body}</QuestionFormAnswers>");

        let flattened = flatten_answer(&xml).unwrap();

        let expected: HashMap<&str, &str> = answers
            .iter()
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect();
        prop_assert_eq!(flattened.len(), expected.len());
        for (question, answer) in expected {
            prop_assert_eq!(flattened.get(question).map(String::as_str), Some(answer));
        }
    }
}
