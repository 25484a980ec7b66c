//! Selection planning: given a predicate list and whether a key-column
//! index is open, decide between an index-driven scan and a full heap scan.
//!
//! A key-column predicate only earns an index seek if it is `Eq`, `Lt`,
//! `Le`, `Gt`, or `Ge` — a lone `Ne` predicate does not narrow where the
//! scan should start, so it never triggers index use on its own. The seek
//! key is the `Eq` literal if one is present, otherwise the largest of any
//! `Gt`/`Ge` literals (the tightest lower bound available).

use crate::predicate::{split, Attr, Comparator, Literal, Predicate, Projection};
use tracing::debug;

/// The chosen access path for a selection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Seek the index to `seek_key` (or the start of the tree, if `None`)
    /// and read forward, applying every predicate as entries are visited.
    IndexScan { seek_key: Option<i32> },
    /// Read every record in the heap, applying every predicate per tuple.
    HeapScan,
}

pub struct Planner;

impl Planner {
    /// Chooses a plan for `predicates` given whether an index is open on
    /// the table's key column and what the query projects.
    pub fn plan(predicates: &[Predicate], index_open: bool, projection: Projection) -> Plan {
        if !index_open {
            return Plan::HeapScan;
        }

        let parts = split(predicates);
        let enables_index = projection == Projection::CountStar
            || parts
                .key_clauses
                .iter()
                .any(|p| key_predicate_enables_index(p.cmp));

        if !enables_index {
            debug!("no index-enabling key predicate; falling back to heap scan");
            return Plan::HeapScan;
        }

        let eq_literal = parts
            .key_clauses
            .iter()
            .find(|p| p.cmp == Comparator::Eq)
            .map(|p| int_literal(p));

        let seek_key = eq_literal.or_else(|| {
            parts
                .key_clauses
                .iter()
                .filter(|p| matches!(p.cmp, Comparator::Gt | Comparator::Ge))
                .map(|p| int_literal(p))
                .max()
        });

        debug!(?seek_key, "planned index scan");
        Plan::IndexScan { seek_key }
    }
}

fn key_predicate_enables_index(cmp: Comparator) -> bool {
    matches!(
        cmp,
        Comparator::Eq | Comparator::Lt | Comparator::Le | Comparator::Gt | Comparator::Ge
    )
}

fn int_literal(p: &Predicate) -> i32 {
    match (&p.literal, p.attr) {
        (Literal::Int(v), Attr::Key) => *v,
        _ => unreachable!("key clause must carry an integer literal"),
    }
}
