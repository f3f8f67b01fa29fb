#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure ceiling system that derives the allowed score from the difficulty level.

use deck_tally_core::DifficultyLevel;

const POINTS_PER_LEVEL: u32 = 10;
const BASE_POINTS: u32 = 20;

/// Derives the score ceiling shared by every entity.
#[derive(Clone, Copy, Debug, Default)]
pub struct CeilingPolicy;

impl CeilingPolicy {
    /// Creates a new ceiling policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maximum score an entity may reach before it is flagged over the limit.
    ///
    /// An active modifier raises the effective level by exactly one before the
    /// `level * 10 + 20` formula is applied.
    #[must_use]
    pub fn ceiling(&self, level: DifficultyLevel, modifier_active: bool) -> u32 {
        let effective = if modifier_active {
            level.get().saturating_add(1)
        } else {
            level.get()
        };
        effective
            .saturating_mul(POINTS_PER_LEVEL)
            .saturating_add(BASE_POINTS)
    }

    /// Ceiling for a raw, unvalidated level. Values below one count as one.
    #[must_use]
    pub fn ceiling_for_raw(&self, level: i64, modifier_active: bool) -> u32 {
        self.ceiling(DifficultyLevel::new(level), modifier_active)
    }
}
