use deck_tally_core::{CategoryId, Command, Counts, EntityId, Event, TallyState};
use deck_tally_persistence::{
    FileStore, KeyValueStore, MemoryStore, PersistenceCodec, SchemaPolicy, Session, STORAGE_KEY,
};
use deck_tally_system_scoring::ScoreEngine;
use deck_tally_world::query;

fn category(index: usize) -> CategoryId {
    CategoryId::new(index).expect("category index in range")
}

fn run<S: KeyValueStore>(session: &mut Session<S>, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        session.apply(command, &mut events);
    }
    events
}

#[test]
fn first_run_starts_from_defaults() {
    let session = Session::open(MemoryStore::new(), PersistenceCodec::default(), STORAGE_KEY);
    assert_eq!(session.snapshot(), TallyState::default());
}

#[test]
fn malformed_payloads_fall_back_to_defaults() {
    let payloads = [
        "not json",
        r#"{"level":0,"modifier":false,"entity1":[0,0,0,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]}"#,
        r#"{"level":1,"entity1":[1,2]}"#,
        r#"{"level":3,"modifier":"yes","entity1":[0,0,0,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]}"#,
        "42",
    ];

    for payload in payloads {
        let store = MemoryStore::new().with_entry(STORAGE_KEY, payload);
        let session = Session::open(store, PersistenceCodec::default(), STORAGE_KEY);
        assert_eq!(
            session.snapshot(),
            TallyState::default(),
            "payload {payload} must fall back to the default state",
        );
    }
}

#[test]
fn clamped_input_is_scored_and_persisted() {
    let mut session = Session::open(MemoryStore::new(), PersistenceCodec::default(), STORAGE_KEY);
    let _ = run(
        &mut session,
        vec![Command::SetCount {
            entity: EntityId::First,
            category: category(0),
            value: 7,
        }],
    );

    let counts = query::counts(session.tally(), EntityId::First);
    assert_eq!(counts.get(category(0)), 5);
    assert_eq!(ScoreEngine::new().total_for(&counts), 100);

    let reopened = Session::open(
        session.into_store(),
        PersistenceCodec::default(),
        STORAGE_KEY,
    );
    assert_eq!(
        query::counts(reopened.tally(), EntityId::First).get(category(0)),
        5
    );
}

#[test]
fn write_failures_never_block_state_updates() {
    let mut session = Session::open(
        MemoryStore::with_quota(4),
        PersistenceCodec::default(),
        STORAGE_KEY,
    );
    let events = run(
        &mut session,
        vec![
            Command::SetLevel { level: 9 },
            Command::IncrementCount {
                entity: EntityId::Second,
                category: category(3),
            },
        ],
    );

    assert_eq!(events.len(), 2);
    assert_eq!(query::level(session.tally()).get(), 9);
    assert_eq!(
        query::counts(session.tally(), EntityId::Second).get(category(3)),
        1
    );
    assert_eq!(session.store().get(STORAGE_KEY), None);
}

#[test]
fn latest_mutation_is_what_gets_persisted() {
    let mut session = Session::open(MemoryStore::new(), PersistenceCodec::default(), STORAGE_KEY);
    let _ = run(
        &mut session,
        vec![
            Command::ToggleModifier,
            Command::SetCount {
                entity: EntityId::Third,
                category: category(7),
                value: 2,
            },
            Command::ResetEntity {
                entity: EntityId::Third,
            },
        ],
    );

    let stored = session
        .store()
        .get(STORAGE_KEY)
        .expect("state was persisted");
    let decoded = session
        .codec()
        .try_decode(&stored)
        .expect("persisted state decodes");
    assert_eq!(decoded, session.snapshot());
    assert!(decoded.modifier);
    assert!(decoded.counts(EntityId::Third).is_zero());
}

#[test]
fn reset_all_zeroes_every_entity() {
    let mut session = Session::open(MemoryStore::new(), PersistenceCodec::default(), STORAGE_KEY);
    let mut commands = vec![Command::SetLevel { level: 4 }];
    for entity in EntityId::ALL {
        commands.push(Command::SetCount {
            entity,
            category: category(1),
            value: 3,
        });
        commands.push(Command::IncrementCount {
            entity,
            category: category(5),
        });
    }
    commands.push(Command::ResetAll);
    let _ = run(&mut session, commands);

    let snapshot = session.snapshot();
    let engine = ScoreEngine::new();
    for entity in EntityId::ALL {
        assert_eq!(snapshot.counts(entity), &Counts::ZERO);
        assert_eq!(engine.evaluate(&snapshot, entity).total, 0);
    }
    assert_eq!(snapshot.level.get(), 4);
}

#[test]
fn legacy_payload_loads_under_lenient_policy_only() {
    let legacy = r#"{"tier":6,"char1Counts":[0,3,0,0,0,0,0,0],"char2Counts":[0,0,0,0,0,0,0,0],"char3Counts":[0,0,0,0,0,0,0,0]}"#;

    let lenient = Session::open(
        MemoryStore::new().with_entry(STORAGE_KEY, legacy),
        PersistenceCodec::new(SchemaPolicy::Lenient),
        STORAGE_KEY,
    );
    assert_eq!(query::level(lenient.tally()).get(), 6);
    assert!(!query::modifier_active(lenient.tally()));

    let strict = Session::open(
        MemoryStore::new().with_entry(STORAGE_KEY, legacy),
        PersistenceCodec::new(SchemaPolicy::Strict),
        STORAGE_KEY,
    );
    assert_eq!(strict.codec().policy(), SchemaPolicy::Strict);
    assert_eq!(strict.snapshot(), TallyState::default());
}

#[test]
fn file_store_survives_across_sessions() {
    let dir = tempfile::tempdir().expect("temp dir");

    let mut first = Session::open(
        FileStore::new(dir.path()),
        PersistenceCodec::default(),
        STORAGE_KEY,
    );
    let _ = run(
        &mut first,
        vec![
            Command::SetLevel { level: 11 },
            Command::SetModifier { active: true },
            Command::SetCount {
                entity: EntityId::Second,
                category: category(6),
                value: 2,
            },
        ],
    );
    let expected = first.snapshot();
    drop(first);

    let second = Session::open(
        FileStore::new(dir.path()),
        PersistenceCodec::default(),
        STORAGE_KEY,
    );
    assert_eq!(second.snapshot(), expected);
    assert_eq!(ScoreEngine::new().ceiling(&expected), 140);
}
