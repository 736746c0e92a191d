//! Phrase selection with soft repetition avoidance.

use rand::Rng;

use super::history::HistoryStore;
use super::phrases::Category;

/// Pick a phrase from `category`, preferring ones not in recent history.
///
/// Once every phrase in the pool has been said recently, any phrase may
/// repeat.
pub fn pick<R: Rng + ?Sized>(category: Category, history: &HistoryStore, rng: &mut R) -> &'static str {
    let pool = category.pool();
    let fresh: Vec<&'static str> = pool
        .iter()
        .copied()
        .filter(|text| !history.was_recently_said(text))
        .collect();

    if fresh.is_empty() {
        pool[rng.gen_range(0..pool.len())]
    } else {
        fresh[rng.gen_range(0..fresh.len())]
    }
}
