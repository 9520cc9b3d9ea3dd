use cheapest_products::merge::{bounded_merge, Run};
use cheapest_products::record::Record;
use proptest::prelude::*;

fn rec(id: i64, cents: u32) -> Record {
    Record {
        id,
        name: format!("p{id}"),
        condition: String::new(),
        state: String::new(),
        price: f64::from(cents) / 100.0,
    }
}

fn any_records(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((0i64..50, 0u32..10_000u32), 0..max_len)
        .prop_map(|rows| rows.into_iter().map(|(id, cents)| rec(id, cents)).collect())
}

// (id, price-bits) multiset; price bits are exact for cents/100 inputs
fn key_multiset<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<(i64, u64)> {
    let mut keys: Vec<(i64, u64)> = records.map(|r| (r.id, r.price.to_bits())).collect();
    keys.sort_unstable();
    keys
}

fn sorted_prices<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<u64> {
    let mut prices: Vec<u64> = records.map(|r| r.price.to_bits()).collect();
    prices.sort_unstable();
    prices
}

#[test]
fn merging_empty_runs_yields_empty() {
    let merged = bounded_merge(Run::empty(), Run::empty(), 8, 2);
    assert_eq!(merged.occupied(), 0);
}

#[test]
fn bound_enforcement_keeps_exactly_five_of_fifty() {
    let a: Vec<Record> = (0..25).map(|i| rec(i, 100 + i as u32)).collect();
    let b: Vec<Record> = (25..50).map(|i| rec(i, 100 + i as u32)).collect();

    let merged = bounded_merge(Run::from_unsorted(a), Run::from_unsorted(b), 5, 20);
    assert_eq!(merged.occupied(), 5);

    let prices: Vec<f64> = merged.into_ascending().iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![1.0, 1.01, 1.02, 1.03, 1.04]);
}

proptest! {
    #[test]
    fn unbounded_merge_is_multiset_union(xs in any_records(40), ys in any_records(40)) {
        let total = xs.len() + ys.len();
        let merged = bounded_merge(
            Run::from_unsorted(xs.clone()),
            Run::from_unsorted(ys.clone()),
            total.max(1),
            total.max(1),
        );
        merged.assert_invariants();
        prop_assert_eq!(merged.occupied(), total);

        let expected = key_multiset(xs.iter().chain(ys.iter()));
        prop_assert_eq!(key_multiset(merged.records()), expected);
    }

    #[test]
    fn duplicate_cap_holds_within_one_merge(
        xs in any_records(40),
        ys in any_records(40),
        cap in 1usize..4,
    ) {
        let total = xs.len() + ys.len();
        let merged = bounded_merge(
            Run::from_unsorted(xs),
            Run::from_unsorted(ys),
            total.max(1),
            cap,
        );
        merged.assert_invariants();

        let mut per_id = std::collections::HashMap::<i64, usize>::new();
        for r in merged.records() {
            *per_id.entry(r.id).or_insert(0) += 1;
        }
        for (&id, &count) in &per_id {
            prop_assert!(count <= cap, "id {} appeared {} times with cap {}", id, count, cap);
        }
    }

    #[test]
    fn bound_keeps_the_cheapest(
        xs in any_records(40),
        ys in any_records(40),
        bound in 1usize..20,
    ) {
        let total = xs.len() + ys.len();
        // cap high enough that only the bound can drop records
        let merged = bounded_merge(
            Run::from_unsorted(xs.clone()),
            Run::from_unsorted(ys.clone()),
            bound,
            total.max(1),
        );
        merged.assert_invariants();
        prop_assert_eq!(merged.occupied(), total.min(bound));

        let mut expected = sorted_prices(xs.iter().chain(ys.iter()));
        expected.truncate(total.min(bound));
        prop_assert_eq!(sorted_prices(merged.records()), expected);
    }
}
