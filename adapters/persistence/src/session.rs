use deck_tally_core::{Command, Event, TallyState};
use deck_tally_world::{apply, query, Tally};

use crate::{KeyValueStore, PersistenceCodec};

/// Single owner of the tally that keeps the store in sync with it.
///
/// The stored payload is loaded once when the session opens. Afterwards every
/// command that changes state is followed by a write of the whole aggregate.
/// Write failures are logged and otherwise ignored; the in-memory tally stays
/// authoritative.
#[derive(Debug)]
pub struct Session<S> {
    tally: Tally,
    store: S,
    codec: PersistenceCodec,
    key: String,
}

impl<S: KeyValueStore> Session<S> {
    /// Opens a session, restoring the stored state or falling back to defaults.
    pub fn open(store: S, codec: PersistenceCodec, key: impl Into<String>) -> Self {
        let key = key.into();
        let tally = match codec.decode(store.get(&key).as_deref()) {
            Some(state) => {
                tracing::info!(key = %key, level = state.level.get(), "restored tally state");
                Tally::from_state(state)
            }
            None => {
                tracing::debug!(
                    key = %key,
                    policy = ?codec.policy(),
                    "starting from default tally state"
                );
                Tally::new()
            }
        };

        Self {
            tally,
            store,
            codec,
            key,
        }
    }

    /// Applies a command and persists the result when it changed state.
    pub fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        let before = out_events.len();
        apply(&mut self.tally, command, out_events);
        if out_events.len() > before {
            self.persist();
        }
    }

    /// Read-only access to the authoritative tally.
    #[must_use]
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Captures the current aggregate.
    #[must_use]
    pub fn snapshot(&self) -> TallyState {
        query::snapshot(&self.tally)
    }

    /// Codec used for loading and saving.
    #[must_use]
    pub fn codec(&self) -> &PersistenceCodec {
        &self.codec
    }

    /// Read-only access to the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Closes the session, handing back the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) {
        let payload = self.codec.encode(&self.snapshot());
        if let Err(error) = self.store.set(&self.key, &payload) {
            tracing::warn!(key = %self.key, %error, "failed to persist tally state");
        }
    }
}
