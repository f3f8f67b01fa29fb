use deck_tally_core::{
    Counts, DifficultyLevel, EntityId, TallyState, CATEGORY_COUNT, ENTITY_COUNT,
};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Keys accepted for the difficulty level. The second entry is the name used
/// by payloads written before the modifier existed.
const LEVEL_KEYS: [&str; 2] = ["level", "tier"];
const MODIFIER_KEY: &str = "modifier";
/// Keys accepted for each entity's count vector, current name first.
const ENTITY_KEYS: [[&str; 2]; ENTITY_COUNT] = [
    ["entity1", "char1Counts"],
    ["entity2", "char2Counts"],
    ["entity3", "char3Counts"],
];

/// How the decoder treats payloads that predate the modifier flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// An absent `modifier` field decodes as `false`.
    #[default]
    Lenient,
    /// An absent `modifier` field rejects the payload.
    Strict,
}

/// Serializes and validates the persisted tally aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PersistenceCodec {
    policy: SchemaPolicy,
}

impl PersistenceCodec {
    /// Creates a codec applying the provided schema policy.
    #[must_use]
    pub const fn new(policy: SchemaPolicy) -> Self {
        Self { policy }
    }

    /// Schema policy applied when decoding.
    #[must_use]
    pub const fn policy(&self) -> SchemaPolicy {
        self.policy
    }

    /// Encodes the whole aggregate into a single JSON document.
    ///
    /// Field order is fixed, so equal states always encode to equal strings.
    #[must_use]
    pub fn encode(&self, state: &TallyState) -> String {
        let payload = PersistedPayload {
            level: state.level,
            modifier: state.modifier,
            entity1: state.counts(EntityId::First),
            entity2: state.counts(EntityId::Second),
            entity3: state.counts(EntityId::Third),
        };
        serde_json::to_string(&payload).expect("tally payload serialization never fails")
    }

    /// Decodes a stored payload, returning `None` for anything malformed.
    ///
    /// Absent payloads and payloads rejected by [`PersistenceCodec::try_decode`]
    /// both yield `None`; the caller falls back to the default state.
    #[must_use]
    pub fn decode(&self, raw: Option<&str>) -> Option<TallyState> {
        let raw = raw?;
        match self.try_decode(raw) {
            Ok(state) => Some(state),
            Err(error) => {
                tracing::debug!(%error, "discarding persisted tally state");
                None
            }
        }
    }

    /// Decodes a stored payload, reporting the first validation failure.
    ///
    /// A single invalid field rejects the whole payload. Counts above a
    /// category cap are clamped rather than rejected.
    pub fn try_decode(&self, raw: &str) -> Result<TallyState, DecodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }

        let value: Value = serde_json::from_str(trimmed).map_err(DecodeError::InvalidJson)?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let level = decode_level(lookup(&fields, &LEVEL_KEYS))?;
        let modifier = self.decode_modifier(fields.get(MODIFIER_KEY))?;
        let mut entities = [Counts::ZERO; ENTITY_COUNT];
        for entity in EntityId::ALL {
            let keys = &ENTITY_KEYS[entity.index()];
            entities[entity.index()] = decode_counts(entity, keys[0], lookup(&fields, keys))?;
        }

        Ok(TallyState::new(level, modifier, entities))
    }

    fn decode_modifier(&self, value: Option<&Value>) -> Result<bool, DecodeError> {
        match (value, self.policy) {
            (Some(Value::Bool(active)), _) => Ok(*active),
            (Some(other), _) => Err(DecodeError::InvalidModifier(other.to_string())),
            (None, SchemaPolicy::Lenient) => Ok(false),
            (None, SchemaPolicy::Strict) => Err(DecodeError::MissingField(MODIFIER_KEY)),
        }
    }
}

/// Reasons a persisted payload may be rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was empty or contained only whitespace.
    #[error("persisted payload was empty")]
    EmptyPayload,
    /// The payload was not valid JSON.
    #[error("could not parse persisted payload: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// The top-level JSON value was not an object.
    #[error("persisted payload is not an object")]
    NotAnObject,
    /// A required field was absent.
    #[error("persisted payload is missing `{0}`")]
    MissingField(&'static str),
    /// The level could not be coerced into an integer.
    #[error("level {0} is not an integer")]
    InvalidLevel(String),
    /// The level was an integer below one.
    #[error("level {0} is below the minimum of 1")]
    LevelBelowMinimum(i64),
    /// The modifier was present but not a boolean.
    #[error("modifier must be a boolean, found {0}")]
    InvalidModifier(String),
    /// An entity's counts were not an array.
    #[error("counts for entity {entity} must be an array")]
    NotAnArray {
        /// One-based entity ordinal.
        entity: u32,
    },
    /// An entity's counts had the wrong number of entries.
    #[error("counts for entity {entity} have {len} entries, expected {}", CATEGORY_COUNT)]
    WrongLength {
        /// One-based entity ordinal.
        entity: u32,
        /// Number of entries found.
        len: usize,
    },
    /// A count entry was not a non-negative integer.
    #[error("count {index} of entity {entity} is not a non-negative integer: {value}")]
    InvalidCount {
        /// One-based entity ordinal.
        entity: u32,
        /// Zero-based category index.
        index: usize,
        /// Offending JSON value.
        value: String,
    },
}

#[derive(Serialize)]
struct PersistedPayload<'a> {
    level: DifficultyLevel,
    modifier: bool,
    entity1: &'a Counts,
    entity2: &'a Counts,
    entity3: &'a Counts,
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

/// Integral value of a JSON number, saturated into `i64`. Fractional and
/// non-finite numbers yield `None`.
fn integral(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if number.is_u64() {
        return Some(i64::MAX);
    }

    number.as_f64().and_then(integral_float)
}

fn integral_float(value: f64) -> Option<i64> {
    // float-to-int casts saturate at the i64 bounds
    (value.is_finite() && value.fract() == 0.0).then(|| value as i64)
}

fn decode_level(value: Option<&Value>) -> Result<DifficultyLevel, DecodeError> {
    let value = value.ok_or(DecodeError::MissingField(LEVEL_KEYS[0]))?;
    let invalid = || DecodeError::InvalidLevel(value.to_string());

    let level = match value {
        Value::Number(number) => integral(number).ok_or_else(invalid)?,
        Value::String(text) => parse_level_text(text).ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    if level < 1 {
        return Err(DecodeError::LevelBelowMinimum(level));
    }

    Ok(DifficultyLevel::new(level))
}

fn parse_level_text(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(level) = trimmed.parse::<i64>() {
        return Some(level);
    }

    trimmed.parse().ok().and_then(integral_float)
}

fn decode_counts(
    entity: EntityId,
    key: &'static str,
    value: Option<&Value>,
) -> Result<Counts, DecodeError> {
    let value = value.ok_or(DecodeError::MissingField(key))?;
    let Value::Array(entries) = value else {
        return Err(DecodeError::NotAnArray {
            entity: entity.ordinal(),
        });
    };
    if entries.len() != CATEGORY_COUNT {
        return Err(DecodeError::WrongLength {
            entity: entity.ordinal(),
            len: entries.len(),
        });
    }

    let mut raw = [0_u32; CATEGORY_COUNT];
    for (index, (entry, slot)) in entries.iter().zip(raw.iter_mut()).enumerate() {
        let count = match entry {
            Value::Number(number) => integral(number)
                .filter(|count| *count >= 0)
                .map(|count| u32::try_from(count).unwrap_or(u32::MAX)),
            _ => None,
        };
        *slot = count.ok_or_else(|| DecodeError::InvalidCount {
            entity: entity.ordinal(),
            index,
            value: entry.to_string(),
        })?;
    }

    Ok(Counts::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_tally_core::CategoryId;

    fn category(index: usize) -> CategoryId {
        CategoryId::new(index).expect("category index in range")
    }

    fn sample_state() -> TallyState {
        TallyState::new(
            DifficultyLevel::new(7),
            true,
            [
                Counts::from_raw([5, 4, 1, 0, 2, 0, 0, 1]),
                Counts::ZERO,
                Counts::ZERO.with_count(category(6), 12),
            ],
        )
    }

    const VALID_ENTITIES: &str =
        r#""entity1":[0,0,0,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]"#;

    #[test]
    fn encode_is_deterministic_and_round_trips() {
        let codec = PersistenceCodec::default();
        let state = sample_state();
        let encoded = codec.encode(&state);

        assert_eq!(encoded, codec.encode(&state));
        assert_eq!(codec.decode(Some(&encoded)), Some(state));
    }

    #[test]
    fn encode_uses_documented_field_names() {
        let encoded = PersistenceCodec::default().encode(&TallyState::default());
        assert_eq!(
            encoded,
            format!(r#"{{"level":1,"modifier":false,{VALID_ENTITIES}}}"#)
        );
    }

    #[test]
    fn absent_and_garbage_payloads_decode_to_none() {
        let codec = PersistenceCodec::default();
        assert_eq!(codec.decode(None), None);
        assert_eq!(codec.decode(Some("")), None);
        assert_eq!(codec.decode(Some("not json")), None);
        assert_eq!(codec.decode(Some("[1,2,3]")), None);
        assert_eq!(codec.decode(Some("null")), None);
    }

    #[test]
    fn level_zero_is_rejected() {
        let raw = format!(r#"{{"level":0,"modifier":false,{VALID_ENTITIES}}}"#);
        let error = PersistenceCodec::default()
            .try_decode(&raw)
            .expect_err("level zero must be rejected");
        assert!(matches!(error, DecodeError::LevelBelowMinimum(0)));
    }

    #[test]
    fn wrong_length_counts_are_rejected() {
        let error = PersistenceCodec::default()
            .try_decode(r#"{"level":1,"entity1":[1,2]}"#)
            .expect_err("short vector must be rejected");
        assert!(matches!(
            error,
            DecodeError::WrongLength { entity: 1, len: 2 }
        ));
    }

    #[test]
    fn level_accepts_numeric_coercions() {
        let codec = PersistenceCodec::default();
        for level in [r#"3"#, r#"3.0"#, r#""3""#, r#"" 3 ""#] {
            let raw = format!(r#"{{"level":{level},{VALID_ENTITIES}}}"#);
            let state = codec.try_decode(&raw).expect("coercible level decodes");
            assert_eq!(state.level.get(), 3, "level {level} should coerce to 3");
        }
    }

    #[test]
    fn level_rejects_non_integers() {
        let codec = PersistenceCodec::default();
        for level in [r#"2.5"#, r#""abc""#, "true", "null", "[1]", r#""""#] {
            let raw = format!(r#"{{"level":{level},{VALID_ENTITIES}}}"#);
            assert!(
                codec.try_decode(&raw).is_err(),
                "level {level} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_levels_saturate() {
        let codec = PersistenceCodec::default();
        for level in ["4294967296", "99999999999999999999", r#""99999999999""#, "1e30"] {
            let raw = format!(r#"{{"level":{level},{VALID_ENTITIES}}}"#);
            let state = codec.try_decode(&raw).expect("large level decodes");
            assert_eq!(state.level.get(), u32::MAX, "level {level} should saturate");
        }
    }

    #[test]
    fn missing_level_is_rejected() {
        let raw = format!(r#"{{"modifier":true,{VALID_ENTITIES}}}"#);
        let error = PersistenceCodec::default()
            .try_decode(&raw)
            .expect_err("missing level must be rejected");
        assert!(matches!(error, DecodeError::MissingField("level")));
    }

    #[test]
    fn mistyped_modifier_is_rejected_under_both_policies() {
        for policy in [SchemaPolicy::Lenient, SchemaPolicy::Strict] {
            for modifier in ["1", r#""true""#, "null"] {
                let raw = format!(r#"{{"level":1,"modifier":{modifier},{VALID_ENTITIES}}}"#);
                let error = PersistenceCodec::new(policy)
                    .try_decode(&raw)
                    .expect_err("mistyped modifier must be rejected");
                assert!(matches!(error, DecodeError::InvalidModifier(_)));
            }
        }
    }

    #[test]
    fn absent_modifier_follows_schema_policy() {
        let raw = format!(r#"{{"level":2,{VALID_ENTITIES}}}"#);

        let lenient = PersistenceCodec::new(SchemaPolicy::Lenient)
            .try_decode(&raw)
            .expect("lenient policy defaults the modifier");
        assert!(!lenient.modifier);

        let strict = PersistenceCodec::new(SchemaPolicy::Strict).try_decode(&raw);
        assert!(matches!(
            strict,
            Err(DecodeError::MissingField("modifier"))
        ));
    }

    #[test]
    fn legacy_field_names_decode() {
        let raw = r#"{"tier":4,"char1Counts":[1,2,0,0,0,0,0,0],"char2Counts":[0,0,0,0,0,0,0,0],"char3Counts":[0,0,0,0,0,0,0,3]}"#;
        let state = PersistenceCodec::default()
            .try_decode(raw)
            .expect("legacy payload decodes");

        assert_eq!(state.level.get(), 4);
        assert!(!state.modifier);
        assert_eq!(state.counts(EntityId::First).get(category(1)), 2);
        assert_eq!(state.counts(EntityId::Third).get(category(7)), 3);
    }

    #[test]
    fn oversized_counts_saturate() {
        let raw = r#"{"level":1,"entity1":[4294967296,0,0,0,0,0,0,4294967296],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,18446744073709551615]}"#;
        let state = PersistenceCodec::default()
            .try_decode(raw)
            .expect("large counts decode");

        assert_eq!(state.counts(EntityId::First).get(category(0)), 5);
        assert_eq!(state.counts(EntityId::First).get(category(7)), u32::MAX);
        assert_eq!(state.counts(EntityId::Third).get(category(7)), u32::MAX);
    }

    #[test]
    fn invalid_count_entries_are_rejected() {
        let codec = PersistenceCodec::default();
        for entry in ["-1", "1.5", r#""2""#, "null"] {
            let raw = format!(
                r#"{{"level":1,"entity1":[0,0,0,0,0,0,0,{entry}],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]}}"#
            );
            let error = codec
                .try_decode(&raw)
                .expect_err("invalid count must be rejected");
            assert!(
                matches!(error, DecodeError::InvalidCount { entity: 1, index: 7, .. }),
                "entry {entry} produced {error:?}",
            );
        }
    }

    #[test]
    fn missing_or_mistyped_entity_is_rejected() {
        let codec = PersistenceCodec::default();
        let missing = codec.try_decode(
            r#"{"level":1,"entity1":[0,0,0,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0]}"#,
        );
        assert!(matches!(missing, Err(DecodeError::MissingField("entity3"))));

        let mistyped = codec.try_decode(
            r#"{"level":1,"entity1":[0,0,0,0,0,0,0,0],"entity2":{},"entity3":[0,0,0,0,0,0,0,0]}"#,
        );
        assert!(matches!(
            mistyped,
            Err(DecodeError::NotAnArray { entity: 2 })
        ));
    }

    #[test]
    fn integral_float_counts_are_accepted() {
        let raw = r#"{"level":1,"entity1":[1.0,0,0,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]}"#;
        let state = PersistenceCodec::default()
            .try_decode(raw)
            .expect("integral float decodes");
        assert_eq!(state.counts(EntityId::First).get(category(0)), 1);
    }

    #[test]
    fn counts_above_cap_are_clamped_on_decode() {
        let raw = r#"{"level":1,"entity1":[9,9,9,0,0,0,0,0],"entity2":[0,0,0,0,0,0,0,0],"entity3":[0,0,0,0,0,0,0,0]}"#;
        let state = PersistenceCodec::default()
            .try_decode(raw)
            .expect("over-cap counts decode");
        assert_eq!(
            state.counts(EntityId::First).as_array(),
            &[5, 4, 9, 0, 0, 0, 0, 0]
        );
    }
}
