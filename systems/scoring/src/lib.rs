#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoring system that aggregates category counts into entity totals.
//!
//! Totals are recomputed from the counts on every call; nothing is cached
//! between mutations.

use deck_tally_core::{CategoryId, Counts, EntityId, TallyState, ENTITY_COUNT};
use deck_tally_system_ceiling::CeilingPolicy;

/// Presentation status of an entity relative to the ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clarity {
    /// The total sits at or below the ceiling.
    Clear,
    /// The total exceeds the ceiling.
    Blurred,
}

/// Contribution of a single category to an entity's total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryLine {
    /// Category being reported.
    pub category: CategoryId,
    /// Stored count.
    pub count: u32,
    /// Points contributed by the count.
    pub points: u32,
}

/// Derived, read-only score report for one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityScore {
    /// Entity being reported.
    pub entity: EntityId,
    /// Sum of all category points.
    pub total: u32,
    /// Ceiling shared by all entities.
    pub ceiling: u32,
    /// `ceiling - total`; negative when over the limit.
    pub remaining: i64,
    /// Whether the total exceeds the ceiling.
    pub over_limit: bool,
}

impl EntityScore {
    /// Presentation status derived from the over-limit flag.
    #[must_use]
    pub const fn clarity(&self) -> Clarity {
        if self.over_limit {
            Clarity::Blurred
        } else {
            Clarity::Clear
        }
    }
}

/// Aggregates category counts into totals and limit checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreEngine {
    ceiling_policy: CeilingPolicy,
}

impl ScoreEngine {
    /// Creates a new scoring system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ceiling_policy: CeilingPolicy::new(),
        }
    }

    /// Sum of category points for the provided counts.
    #[must_use]
    pub fn total_for(&self, counts: &Counts) -> u32 {
        counts.iter().fold(0_u32, |total, (category, count)| {
            total.saturating_add(category.category().points_for(count))
        })
    }

    /// Points left before reaching the ceiling. Negative when over the limit.
    #[must_use]
    pub fn remaining(&self, counts: &Counts, ceiling: u32) -> i64 {
        i64::from(ceiling) - i64::from(self.total_for(counts))
    }

    /// Reports whether the counts exceed the ceiling.
    #[must_use]
    pub fn is_over_limit(&self, counts: &Counts, ceiling: u32) -> bool {
        self.remaining(counts, ceiling) < 0
    }

    /// Per-category breakdown of the provided counts in table order.
    pub fn breakdown<'a>(&self, counts: &'a Counts) -> impl Iterator<Item = CategoryLine> + 'a {
        counts.iter().map(|(category, count)| CategoryLine {
            category,
            count,
            points: category.category().points_for(count),
        })
    }

    /// Ceiling derived from the state's level and modifier.
    #[must_use]
    pub fn ceiling(&self, state: &TallyState) -> u32 {
        self.ceiling_policy.ceiling(state.level, state.modifier)
    }

    /// Score report for a single entity.
    #[must_use]
    pub fn evaluate(&self, state: &TallyState, entity: EntityId) -> EntityScore {
        let counts = state.counts(entity);
        let ceiling = self.ceiling(state);
        let total = self.total_for(counts);
        let remaining = i64::from(ceiling) - i64::from(total);
        EntityScore {
            entity,
            total,
            ceiling,
            remaining,
            over_limit: remaining < 0,
        }
    }

    /// Score reports for every entity in display order.
    #[must_use]
    pub fn scoreboard(&self, state: &TallyState) -> [EntityScore; ENTITY_COUNT] {
        EntityId::ALL.map(|entity| self.evaluate(state, entity))
    }
}
