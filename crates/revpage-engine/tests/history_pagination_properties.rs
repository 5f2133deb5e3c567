#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeSet;

use common::{apply, drain, records, repo, ts};
use proptest::prelude::*;
use revpage_core::continuation::CursorMode;
use revpage_core::sink::ResultBudget;
use revpage_core::QueryConfig;
use revpage_engine::HistoryQuery;

const IDS: [&str; 4] = ["A.png", "B|C.png", "b.png", "c.png"];

/// Up to four entities, each with up to six distinct revision times
fn histories() -> impl Strategy<Value = Vec<BTreeSet<i64>>> {
    prop::collection::vec(prop::collection::btree_set(1i64..100, 0..6), 1..=IDS.len())
}

fn cursor_mode() -> impl Strategy<Value = CursorMode> {
    prop_oneof![Just(CursorMode::Auto), Just(CursorMode::Compound)]
}

/// Optional inclusive `(start, end)` bounds in seconds, newest bound first
fn window() -> impl Strategy<Value = (Option<i64>, Option<i64>)> {
    (prop::option::of(0i64..110), prop::option::of(0i64..110)).prop_map(|bounds| match bounds {
        (Some(a), Some(b)) => (Some(a.max(b)), Some(a.min(b))),
        other => other,
    })
}

fn build(histories: &[BTreeSet<i64>]) -> revpage_core::MemoryRepo {
    let times: Vec<Vec<i64>> = histories
        .iter()
        .map(|set| set.iter().copied().collect())
        .collect();
    let spec: Vec<(&str, &[i64])> = IDS
        .iter()
        .zip(times.iter())
        .map(|(id, t)| (*id, t.as_slice()))
        .collect();
    repo(&spec)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_paging_returns_every_revision_exactly_once(
        histories in histories(),
        limit in 1usize..4,
        max_records in 1usize..5,
        mode in cursor_mode(),
    ) {
        let repo = build(&histories);
        let query = HistoryQuery::default().with_limit(limit);

        let paged = drain(
            &repo,
            &QueryConfig {
                cursor_mode: mode,
                budget: ResultBudget::records(max_records),
                ..QueryConfig::default()
            },
            &query,
        );

        let unbounded = records(&apply(
            &repo,
            &QueryConfig {
                budget: ResultBudget::unlimited(),
                ..QueryConfig::default()
            },
            &HistoryQuery::default().with_limit(500),
        ));

        let mut expected: Vec<(String, i64)> = IDS
            .iter()
            .zip(histories.iter())
            .flat_map(|(id, set)| set.iter().rev().map(move |t| (id.to_string(), *t)))
            .collect();
        expected.sort();

        let mut seen = paged;
        seen.sort();
        prop_assert_eq!(&seen, &expected);

        let mut single_call = unbounded;
        single_call.sort();
        prop_assert_eq!(&single_call, &expected);
    }

    #[test]
    fn prop_smaller_budget_never_returns_more(
        histories in histories(),
        limit in 1usize..6,
    ) {
        let repo = build(&histories);
        let query = HistoryQuery::default().with_limit(limit);

        let mut previous = 0;
        for max_records in 1..8 {
            let page = apply(
                &repo,
                &QueryConfig {
                    budget: ResultBudget::records(max_records),
                    ..QueryConfig::default()
                },
                &query,
            );
            let count = page.record_count();
            prop_assert!(count <= max_records);
            prop_assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn prop_byte_budget_and_window_page_exactly_once(
        histories in histories(),
        limit in 1usize..4,
        // Always room for one header plus one default-props record
        max_bytes in 160usize..600,
        (start, end) in window(),
        mode in cursor_mode(),
    ) {
        let repo = build(&histories);
        let query = HistoryQuery::default()
            .with_limit(limit)
            .with_window(start.map(ts), end.map(ts));

        let paged = drain(
            &repo,
            &QueryConfig {
                cursor_mode: mode,
                budget: ResultBudget::bytes(max_bytes),
                ..QueryConfig::default()
            },
            &query,
        );

        let unbounded = records(&apply(
            &repo,
            &QueryConfig {
                budget: ResultBudget::unlimited(),
                ..QueryConfig::default()
            },
            &query.clone().with_limit(500),
        ));

        let in_window = |t: i64| start.map_or(true, |s| t <= s) && end.map_or(true, |e| t >= e);
        let mut expected: Vec<(String, i64)> = IDS
            .iter()
            .zip(histories.iter())
            .flat_map(|(id, set)| {
                set.iter()
                    .rev()
                    .copied()
                    .filter(|t| in_window(*t))
                    .map(move |t| (id.to_string(), t))
            })
            .collect();
        expected.sort();

        let mut seen = paged;
        seen.sort();
        prop_assert_eq!(&seen, &expected);

        let mut single_call = unbounded;
        single_call.sort();
        prop_assert_eq!(&single_call, &expected);
    }
}
