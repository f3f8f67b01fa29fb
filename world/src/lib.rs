#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tally state management for Deck Tally.

use deck_tally_core::{
    CategoryId, Command, Counts, DifficultyLevel, EntityId, Event, TallyState, ENTITY_COUNT,
};

/// Represents the authoritative Deck Tally state.
///
/// The only way to change a tally is through [`apply`], which routes every
/// count update through the category caps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    level: DifficultyLevel,
    modifier: bool,
    entities: [Counts; ENTITY_COUNT],
}

impl Tally {
    /// Creates a tally at level one with the modifier off and all counts zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tally seeded from a previously captured state.
    #[must_use]
    pub fn from_state(state: TallyState) -> Self {
        Self {
            level: state.level,
            modifier: state.modifier,
            entities: state.entities,
        }
    }

    fn update_counts(
        &mut self,
        entity: EntityId,
        category: CategoryId,
        next: Counts,
        out_events: &mut Vec<Event>,
    ) {
        let slot = &mut self.entities[entity.index()];
        if *slot == next {
            return;
        }

        *slot = next;
        out_events.push(Event::CountChanged {
            entity,
            category,
            count: next.get(category),
        });
    }

    fn reset_entity(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        let slot = &mut self.entities[entity.index()];
        if slot.is_zero() {
            return;
        }

        *slot = Counts::ZERO;
        out_events.push(Event::EntityReset { entity });
    }

    fn set_modifier(&mut self, active: bool, out_events: &mut Vec<Event>) {
        if self.modifier == active {
            return;
        }

        self.modifier = active;
        out_events.push(Event::ModifierChanged { active });
    }
}

/// Applies the provided command to the tally, mutating state deterministically.
///
/// Events are appended only when the command changed state.
pub fn apply(tally: &mut Tally, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetLevel { level } => {
            let level = DifficultyLevel::new(level);
            if tally.level != level {
                tally.level = level;
                out_events.push(Event::LevelChanged { level });
            }
        }
        Command::ToggleModifier => {
            let active = !tally.modifier;
            tally.set_modifier(active, out_events);
        }
        Command::SetModifier { active } => tally.set_modifier(active, out_events),
        Command::SetCount {
            entity,
            category,
            value,
        } => {
            let next = tally.entities[entity.index()].with_count(category, value);
            tally.update_counts(entity, category, next, out_events);
        }
        Command::IncrementCount { entity, category } => {
            let next = tally.entities[entity.index()].incremented(category);
            tally.update_counts(entity, category, next, out_events);
        }
        Command::DecrementCount { entity, category } => {
            let next = tally.entities[entity.index()].decremented(category);
            tally.update_counts(entity, category, next, out_events);
        }
        Command::ResetEntity { entity } => tally.reset_entity(entity, out_events),
        Command::ResetAll => {
            for entity in EntityId::ALL {
                tally.reset_entity(entity, out_events);
            }
        }
        Command::RestoreState { state } => {
            let restored = Tally::from_state(state);
            if *tally != restored {
                *tally = restored;
                out_events.push(Event::StateRestored);
            }
        }
    }
}

/// Query functions that provide read-only access to the tally state.
pub mod query {
    use super::Tally;
    use deck_tally_core::{Counts, DifficultyLevel, EntityId, TallyState};

    /// Active difficulty level.
    #[must_use]
    pub fn level(tally: &Tally) -> DifficultyLevel {
        tally.level
    }

    /// Reports whether the modifier flag is active.
    #[must_use]
    pub fn modifier_active(tally: &Tally) -> bool {
        tally.modifier
    }

    /// Count vector tracked for the provided entity.
    #[must_use]
    pub fn counts(tally: &Tally, entity: EntityId) -> Counts {
        tally.entities[entity.index()]
    }

    /// Captures the whole aggregate as an immutable snapshot.
    #[must_use]
    pub fn snapshot(tally: &Tally) -> TallyState {
        TallyState::new(tally.level, tally.modifier, tally.entities)
    }
}
