use crate::model::error::ModelError;
use crate::utils::{ANONYMOUS_DISPLAY_NAME, MAX_DISPLAY_NAME_LEN, MAX_PARTICIPANT_ID_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity chosen by the client. Stable across reconnects of the same
/// browser session, unlike the transport connection it arrives on.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value.chars().count() <= MAX_PARTICIPANT_ID_LEN
            && !value.chars().any(|c| c.is_whitespace() || c.is_control());

        if valid {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidParticipantId {
                value,
                max: MAX_PARTICIPANT_ID_LEN,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What other participants learn about someone: never the connection handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub display_name: String,
}

impl ParticipantInfo {
    pub fn new(id: ParticipantId, display_name: impl AsRef<str>) -> Self {
        Self {
            id,
            display_name: normalize_display_name(display_name.as_ref()),
        }
    }
}

/// Trims and truncates a display name. Names are not unique and not validated
/// beyond that; an empty name becomes the anonymous label.
pub fn normalize_display_name(raw: &str) -> String {
    let trimmed: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_LEN)
        .collect();

    if trimmed.is_empty() {
        ANONYMOUS_DISPLAY_NAME.to_owned()
    } else {
        trimmed
    }
}
