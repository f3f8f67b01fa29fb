#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Deck Tally engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative tally, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the tally executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually changed. Systems derive scores and ceilings from immutable
//! snapshots and never mutate state themselves.
//!
//! The static [`CATEGORIES`] table lives here as well: every category is plain
//! data (a label, an optional cap and a [`ScoringRule`]) so adding a category
//! never requires a new code path.

use serde::{Deserialize, Serialize};

/// Number of scoring categories tracked for every entity.
pub const CATEGORY_COUNT: usize = 8;

/// Number of independently tracked entities.
pub const ENTITY_COUNT: usize = 3;

/// Points awarded for the first, second, third and fourth duplicated card.
const DUPLICATE_SCHEDULE: [u32; 4] = [0, 0, 40, 40];

/// Static scoring table, index-aligned with every [`Counts`] vector.
pub static CATEGORIES: [Category; CATEGORY_COUNT] = [
    Category::new("Removed starter card", Some(5), ScoringRule::PerUnit(20)),
    Category::new(
        "Duplicated card",
        Some(4),
        ScoringRule::Schedule(&DUPLICATE_SCHEDULE),
    ),
    Category::new("Divine flash card", None, ScoringRule::PerUnit(20)),
    Category::new("Neutral card", None, ScoringRule::PerUnit(20)),
    Category::new("Equipment reforge", None, ScoringRule::PerUnit(10)),
    Category::new("Common monster card", None, ScoringRule::PerUnit(20)),
    Category::new("Rare monster card", None, ScoringRule::PerUnit(50)),
    Category::new("Legendary monster card", None, ScoringRule::PerUnit(80)),
];

/// Commands that express all permissible tally mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Sets the difficulty level. Values below one are raised to one.
    SetLevel {
        /// Requested level before coercion.
        level: i64,
    },
    /// Flips the modifier flag.
    ToggleModifier,
    /// Forces the modifier flag into the provided state.
    SetModifier {
        /// Desired modifier state.
        active: bool,
    },
    /// Sets a single category count, clamping the raw value into range.
    SetCount {
        /// Entity whose counts are updated.
        entity: EntityId,
        /// Category being updated.
        category: CategoryId,
        /// Raw requested value. Negative values become zero.
        value: i64,
    },
    /// Adds one to a category count unless it already sits at the cap.
    IncrementCount {
        /// Entity whose counts are updated.
        entity: EntityId,
        /// Category being updated.
        category: CategoryId,
    },
    /// Removes one from a category count, never dropping below zero.
    DecrementCount {
        /// Entity whose counts are updated.
        entity: EntityId,
        /// Category being updated.
        category: CategoryId,
    },
    /// Replaces a single entity's counts with the all-zero vector.
    ResetEntity {
        /// Entity to reset.
        entity: EntityId,
    },
    /// Resets every entity while preserving level and modifier.
    ResetAll,
    /// Replaces the whole aggregate with a previously captured state.
    RestoreState {
        /// State that becomes authoritative.
        state: TallyState,
    },
}

/// Events broadcast by the tally after processing commands.
///
/// Events are only emitted for commands that changed state; a no-op command
/// (for example incrementing a capped count) produces no events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the difficulty level changed.
    LevelChanged {
        /// Level that became active.
        level: DifficultyLevel,
    },
    /// Announces that the modifier flag changed.
    ModifierChanged {
        /// Modifier state that became active.
        active: bool,
    },
    /// Confirms that a category count changed.
    CountChanged {
        /// Entity whose counts changed.
        entity: EntityId,
        /// Category that changed.
        category: CategoryId,
        /// Count stored after clamping.
        count: u32,
    },
    /// Confirms that an entity was reset to all zeros.
    EntityReset {
        /// Entity that was reset.
        entity: EntityId,
    },
    /// Confirms that the whole aggregate was replaced.
    StateRestored,
}

/// Identifies one of the three tracked entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    /// First tracked entity.
    First,
    /// Second tracked entity.
    Second,
    /// Third tracked entity.
    Third,
}

impl EntityId {
    /// All entities in display order.
    pub const ALL: [EntityId; ENTITY_COUNT] = [Self::First, Self::Second, Self::Third];

    /// Resolves a one-based ordinal into an entity identifier.
    #[must_use]
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    /// One-based ordinal used for display and persistence keys.
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    /// Zero-based index into per-entity arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }
}

/// Zero-based index into the [`CATEGORIES`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(usize);

impl CategoryId {
    /// Creates a category identifier when the index lies inside the table.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < CATEGORY_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Iterator over every category identifier in table order.
    pub fn all() -> impl Iterator<Item = CategoryId> {
        (0..CATEGORY_COUNT).map(Self)
    }

    /// Retrieves the zero-based table index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// Static category record addressed by this identifier.
    #[must_use]
    pub fn category(&self) -> &'static Category {
        &CATEGORIES[self.0]
    }
}

/// Rule mapping a (cap-bounded) count to points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringRule {
    /// Every unit is worth the same number of points.
    PerUnit(u32),
    /// The k-th unit is worth `schedule[k - 1]` points. Units beyond the end of
    /// the schedule contribute nothing.
    Schedule(&'static [u32]),
}

impl ScoringRule {
    /// Points awarded for `count` units under this rule.
    #[must_use]
    pub fn points(self, count: u32) -> u32 {
        match self {
            Self::PerUnit(points) => count.saturating_mul(points),
            Self::Schedule(schedule) => {
                let units = usize::try_from(count).unwrap_or(usize::MAX);
                schedule
                    .iter()
                    .take(units)
                    .fold(0_u32, |sum, points| sum.saturating_add(*points))
            }
        }
    }
}

/// Countable item type with its own cap and scoring rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Category {
    label: &'static str,
    cap: Option<u32>,
    rule: ScoringRule,
}

impl Category {
    /// Creates a category record.
    #[must_use]
    pub const fn new(label: &'static str, cap: Option<u32>, rule: ScoringRule) -> Self {
        Self { label, cap, rule }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Maximum count, or `None` when unbounded.
    #[must_use]
    pub const fn cap(&self) -> Option<u32> {
        self.cap
    }

    /// Scoring rule applied to the bounded count.
    #[must_use]
    pub const fn rule(&self) -> ScoringRule {
        self.rule
    }

    /// Clamps a count into `[0, cap]`.
    #[must_use]
    pub fn clamp(&self, count: u32) -> u32 {
        match self.cap {
            Some(cap) => count.min(cap),
            None => count,
        }
    }

    /// Points contributed by `count` units.
    ///
    /// Counts above the cap are truncated before the rule is applied, so the
    /// result is safe for any input.
    #[must_use]
    pub fn points_for(&self, count: u32) -> u32 {
        self.rule.points(self.clamp(count))
    }
}

/// Points contributed by `count` units of the provided category.
#[must_use]
pub fn points_for(category: CategoryId, count: u32) -> u32 {
    category.category().points_for(count)
}

/// Cap of the provided category, or `None` when unbounded.
#[must_use]
pub fn effective_cap(category: CategoryId) -> Option<u32> {
    category.category().cap()
}

/// Parses free-form count input the way a numeric text box would.
///
/// Leading whitespace is skipped, an optional sign and the leading run of
/// digits are read, and anything else yields zero. Values that overflow
/// saturate. The result is a raw value suitable for [`Command::SetCount`] and
/// [`Command::SetLevel`].
#[must_use]
pub fn parse_count_input(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |value, digit| {
            value
                .saturating_mul(10)
                .saturating_add(i64::from(digit - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Count vector for a single entity, index-aligned with [`CATEGORIES`].
///
/// Every constructor and update clamps through the category caps, so a value
/// of this type always satisfies `counts[i] <= cap(i)`. Updates return a new
/// vector and never modify the receiver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; CATEGORY_COUNT]", into = "[u32; CATEGORY_COUNT]")]
pub struct Counts([u32; CATEGORY_COUNT]);

impl Counts {
    /// The all-zero vector.
    pub const ZERO: Counts = Counts([0; CATEGORY_COUNT]);

    /// Builds a count vector, clamping each entry to its category cap.
    #[must_use]
    pub fn from_raw(raw: [u32; CATEGORY_COUNT]) -> Self {
        let mut counts = [0; CATEGORY_COUNT];
        for (category, slot) in CategoryId::all().zip(counts.iter_mut()) {
            *slot = category.category().clamp(raw[category.index()]);
        }
        Self(counts)
    }

    /// Count stored for the provided category.
    #[must_use]
    pub const fn get(&self, category: CategoryId) -> u32 {
        self.0[category.index()]
    }

    /// Returns a copy with one entry replaced by the clamped raw value.
    #[must_use]
    pub fn with_count(&self, category: CategoryId, raw: i64) -> Self {
        let floored = u32::try_from(raw.max(0)).unwrap_or(u32::MAX);
        let mut next = self.0;
        next[category.index()] = category.category().clamp(floored);
        Self(next)
    }

    /// Returns a copy with one entry raised by one, bounded by the cap.
    #[must_use]
    pub fn incremented(&self, category: CategoryId) -> Self {
        self.with_count(category, i64::from(self.get(category)) + 1)
    }

    /// Returns a copy with one entry lowered by one, bounded by zero.
    #[must_use]
    pub fn decremented(&self, category: CategoryId) -> Self {
        self.with_count(category, i64::from(self.get(category)) - 1)
    }

    /// Reports whether every entry is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Raw entries in table order.
    #[must_use]
    pub const fn as_array(&self) -> &[u32; CATEGORY_COUNT] {
        &self.0
    }

    /// Iterator pairing each category with its stored count.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, u32)> + '_ {
        CategoryId::all().map(move |category| (category, self.get(category)))
    }
}

impl From<[u32; CATEGORY_COUNT]> for Counts {
    fn from(raw: [u32; CATEGORY_COUNT]) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Counts> for [u32; CATEGORY_COUNT] {
    fn from(counts: Counts) -> Self {
        counts.0
    }
}

/// Difficulty level driving the score ceiling. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct DifficultyLevel(u32);

impl DifficultyLevel {
    /// Lowest permitted level.
    pub const MIN: DifficultyLevel = DifficultyLevel(1);

    /// Coerces a raw value into a level, raising anything below one to one.
    #[must_use]
    pub fn new(raw: i64) -> Self {
        Self(u32::try_from(raw.max(1)).unwrap_or(u32::MAX))
    }

    /// Numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Level one step higher, never exceeding `display_max` unless already above it.
    #[must_use]
    pub fn stepped_up(self, display_max: u32) -> Self {
        if self.0 >= display_max {
            return self;
        }
        Self(self.0 + 1)
    }

    /// Level one step lower, never dropping below [`DifficultyLevel::MIN`].
    #[must_use]
    pub fn stepped_down(self) -> Self {
        Self(self.0.saturating_sub(1).max(1))
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<u32> for DifficultyLevel {
    fn from(raw: u32) -> Self {
        Self::new(i64::from(raw))
    }
}

impl From<DifficultyLevel> for u32 {
    fn from(level: DifficultyLevel) -> Self {
        level.0
    }
}

/// Complete input state: level, modifier and the three count vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TallyState {
    /// Active difficulty level.
    pub level: DifficultyLevel,
    /// Whether the modifier raises the effective level by one.
    pub modifier: bool,
    /// Count vectors indexed by [`EntityId::index`].
    pub entities: [Counts; ENTITY_COUNT],
}

impl TallyState {
    /// Creates a state from its parts.
    #[must_use]
    pub const fn new(level: DifficultyLevel, modifier: bool, entities: [Counts; ENTITY_COUNT]) -> Self {
        Self {
            level,
            modifier,
            entities,
        }
    }

    /// Count vector tracked for the provided entity.
    #[must_use]
    pub const fn counts(&self, entity: EntityId) -> &Counts {
        &self.entities[entity.index()]
    }
}
