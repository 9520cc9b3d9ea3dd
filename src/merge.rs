// src/merge.rs
//! Bounded two-way merge of price-sorted runs.
//!
//! This module is the pure heart of the pipeline. A [`Run`] is a fixed-length
//! sequence of optional record slots, sorted descending by price over its
//! occupied slots. Unoccupied slots appear when a candidate is rejected by the
//! duplicate cap; merge cursors skip them, they are never compacted mid-merge.
//!
//! [`bounded_merge`] folds two runs into one of length
//! `min(occupied(a) + occupied(b), result_rows)`. Both inputs are walked from
//! their cheapest occupied slot toward the expensive end and the result fills
//! from its last slot backward, cheaper candidate first, so the occupied slots
//! stay descending and the records dropped when the bound cuts filling short
//! are the most expensive ones. A per-call counter caps how many accepted
//! records may share an id within one merge; the counter is never carried
//! across calls, so the cap is local to each merge, not global to a pipeline.
//!
//! ## Example
//!
//! ```rust
//! use cheapest_products::merge::{bounded_merge, Run};
//! use cheapest_products::record::Record;
//!
//! let rec = |id: i64, price: f64| Record {
//!     id,
//!     name: format!("p{id}"),
//!     condition: String::new(),
//!     state: String::new(),
//!     price,
//! };
//!
//! let a = Run::from_unsorted(vec![rec(1, 9.5), rec(2, 4.25)]);
//! let b = Run::from_unsorted(vec![rec(3, 6.0)]);
//!
//! let merged = bounded_merge(a, b, 10, 20);
//! assert_eq!(merged.occupied(), 3);
//!
//! let prices: Vec<f64> = merged.into_ascending().iter().map(|r| r.price).collect();
//! assert_eq!(prices, vec![4.25, 6.0, 9.5]);
//! ```

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::record::Record;

/// A bounded, descending-by-price sequence of record slots. Length is fixed
/// at creation and never grows.
#[derive(Clone, Debug, Default)]
pub struct Run {
    slots: Vec<Option<Record>>,
}

impl Run {
    /// A run with no slots at all.
    pub fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Sort a freshly parsed batch descending by price and wrap it; every
    /// slot is occupied.
    pub fn from_unsorted(mut records: Vec<Record>) -> Self {
        records.sort_by(|x, y| y.price.total_cmp(&x.price));
        Self { slots: records.into_iter().map(Some).collect() }
    }

    /// Total slot count, occupied or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Occupied slots, dearest first.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().flatten()
    }

    /// Strip unoccupied slots and return the records cheapest first. The sort
    /// is stable, so repeated assembly of equal runs yields equal sequences.
    pub fn into_ascending(self) -> Vec<Record> {
        let mut records: Vec<Record> = self.slots.into_iter().flatten().collect();
        records.sort_by(|x, y| x.price.total_cmp(&y.price));
        records
    }

    pub fn assert_invariants(&self) {
        // occupied slots must be descending by price (total order, NaN included)
        let prices: Vec<f64> = self.records().map(|r| r.price).collect();
        assert!(
            prices.windows(2).all(|w| w[0].total_cmp(&w[1]) != Ordering::Less),
            "run not descending by price"
        );
    }
}

/// Cursor over a run's slots, positioned on the cheapest not-yet-consumed
/// occupied slot. Unoccupied slots are skipped.
struct Tail<'a> {
    slots: &'a mut [Option<Record>],
    // one past the current slot; 0 = side exhausted
    cursor: usize,
}

impl<'a> Tail<'a> {
    fn new(slots: &'a mut [Option<Record>]) -> Self {
        let cursor = slots.len();
        let mut tail = Self { slots, cursor };
        tail.seek();
        tail
    }

    fn seek(&mut self) {
        while self.cursor > 0 && self.slots[self.cursor - 1].is_none() {
            self.cursor -= 1;
        }
    }

    fn peek(&self) -> Option<&Record> {
        self.cursor.checked_sub(1).and_then(|k| self.slots[k].as_ref())
    }

    fn pop(&mut self) -> Option<Record> {
        let k = self.cursor.checked_sub(1)?;
        let record = self.slots[k].take();
        self.cursor = k;
        self.seek();
        record
    }
}

/// Merge two descending runs into one bounded, duplicate-capped descending
/// run. Pure: no I/O, no shared state, no effect beyond the returned run.
pub fn bounded_merge(mut a: Run, mut b: Run, result_rows: usize, duplicate_cap: usize) -> Run {
    let len = (a.occupied() + b.occupied()).min(result_rows);
    let mut slots: Vec<Option<Record>> = Vec::with_capacity(len);
    slots.resize_with(len, || None);

    // scoped to this call: caps how many accepted records share an id here
    let mut accepted_per_id: HashMap<i64, usize> = HashMap::new();
    let mut insert_at = len;

    let mut a = Tail::new(&mut a.slots);
    let mut b = Tail::new(&mut b.slots);

    while insert_at > 0 {
        let take_a = match (a.peek(), b.peek()) {
            // cheaper candidate first; on a price tie `a` wins
            (Some(x), Some(y)) => x.price.total_cmp(&y.price) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let Some(record) = (if take_a { a.pop() } else { b.pop() }) else {
            break;
        };
        let accepted = accepted_per_id.entry(record.id).or_insert(0);
        if *accepted < duplicate_cap {
            *accepted += 1;
            insert_at -= 1;
            slots[insert_at] = Some(record);
        }
        // a capped duplicate is dropped without consuming a result slot
    }

    Run { slots }
}
