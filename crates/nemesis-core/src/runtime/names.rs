// nemesis-core/src/runtime/names.rs
// ============================================================================
// Module: Random Names
// Description: Random person names for insert and update traffic.
// Purpose: Produce plausible text values without external data files.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Insert and update traffic writes `First Last` names drawn from two fixed
//! lists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::seq::SliceRandom;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Given names sampled for generated rows.
const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Brian", "Claude", "Donald", "Edsger", "Frances", "Grace", "Guido",
    "Hedy", "Ken", "Leslie", "Linus", "Margaret", "Niklaus", "Radia", "Rob", "Sophie", "Tony",
];

/// Family names sampled for generated rows.
const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Cerf", "Dijkstra", "Hamilton", "Hoare", "Hopper", "Kernighan", "Knuth",
    "Lamport", "Liskov", "Lovelace", "McCarthy", "Perlman", "Pike", "Ritchie", "Stroustrup",
    "Thompson", "Torvalds", "Wirth",
];

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Returns a random `First Last` name. Names never contain quotes, so they
/// can be inlined into SQL literals.
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lovelace");
    format!("{first} {last}")
}
