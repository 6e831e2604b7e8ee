use crate::model::participant::{ParticipantId, ParticipantInfo};
use crate::model::room::RoomId;
use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Same JSON shape as the browser's `RTCIceCandidateInit`, so candidates pass
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offer => f.write_str("offer"),
            Self::Answer => f.write_str("answer"),
            Self::IceCandidate => f.write_str("ice-candidate"),
        }
    }
}

/// Negotiation payload relayed between two participants. The server never
/// looks inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate(IceCandidate),
}

impl SignalPayload {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Offer { .. } => SignalKind::Offer,
            Self::Answer { .. } => SignalKind::Answer,
            Self::IceCandidate(_) => SignalKind::IceCandidate,
        }
    }

    pub fn into_client_message(self, target_id: ParticipantId) -> ClientMessage {
        match self {
            Self::Offer { sdp } => ClientMessage::SendOffer { target_id, sdp },
            Self::Answer { sdp } => ClientMessage::SendAnswer { target_id, sdp },
            Self::IceCandidate(candidate) => ClientMessage::SendIceCandidate {
                target_id,
                candidate,
            },
        }
    }

    /// Tags the payload with the sender so the target knows which link it
    /// belongs to.
    pub fn into_server_message(self, sender: &ParticipantInfo) -> ServerMessage {
        let sender_id = sender.id.clone();
        let sender_name = sender.display_name.clone();

        match self {
            Self::Offer { sdp } => ServerMessage::ReceiveOffer {
                sender_id,
                sender_name,
                sdp,
            },
            Self::Answer { sdp } => ServerMessage::ReceiveAnswer {
                sender_id,
                sender_name,
                sdp,
            },
            Self::IceCandidate(candidate) => ServerMessage::ReceiveIceCandidate {
                sender_id,
                sender_name,
                candidate,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    DuplicateParticipant,
    NotJoined,
    AlreadyJoined,
    InvalidMessage,
    InvalidRoom,
    SessionReplaced,
}

/// Everything a participant may send over its signaling socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
    },
    SendOffer {
        target_id: ParticipantId,
        sdp: String,
    },
    SendAnswer {
        target_id: ParticipantId,
        sdp: String,
    },
    SendIceCandidate {
        target_id: ParticipantId,
        candidate: IceCandidate,
    },
    ChatMessage {
        text: String,
    },
    LeaveRoom(NoPayload),
}

/// Body of a message that carries nothing. Reads an absent, `null` or
/// object `d` (keys ignored) and writes `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoPayload;

impl Serialize for NoPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for NoPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NoPayloadVisitor;

        impl<'de> Visitor<'de> for NoPayloadVisitor {
            type Value = NoPayload;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("nothing, null or an object")
            }

            fn visit_none<E: de::Error>(self) -> Result<NoPayload, E> {
                Ok(NoPayload)
            }

            fn visit_unit<E: de::Error>(self) -> Result<NoPayload, E> {
                Ok(NoPayload)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<NoPayload, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_map(NoPayloadVisitor)
            }

            fn visit_map<A>(self, mut map: A) -> Result<NoPayload, A::Error>
            where
                A: MapAccess<'de>,
            {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(NoPayload)
            }
        }

        deserializer.deserialize_option(NoPayloadVisitor)
    }
}

impl ClientMessage {
    /// Splits a relay request into its target and payload.
    pub fn into_signal(self) -> Result<(ParticipantId, SignalPayload), Self> {
        match self {
            Self::SendOffer { target_id, sdp } => Ok((target_id, SignalPayload::Offer { sdp })),
            Self::SendAnswer { target_id, sdp } => Ok((target_id, SignalPayload::Answer { sdp })),
            Self::SendIceCandidate {
                target_id,
                candidate,
            } => Ok((target_id, SignalPayload::IceCandidate(candidate))),
            other => Err(other),
        }
    }
}

/// Everything the coordinator may push to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    CurrentUsers {
        users: Vec<ParticipantInfo>,
    },
    UserConnected {
        participant_id: ParticipantId,
        display_name: String,
    },
    UserDisconnected {
        participant_id: ParticipantId,
        display_name: String,
    },
    ReceiveOffer {
        sender_id: ParticipantId,
        sender_name: String,
        sdp: String,
    },
    ReceiveAnswer {
        sender_id: ParticipantId,
        sender_name: String,
        sdp: String,
    },
    ReceiveIceCandidate {
        sender_id: ParticipantId,
        sender_name: String,
        candidate: IceCandidate,
    },
    ReceiveMessage {
        sender_id: ParticipantId,
        sender_name: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    pub fn user_connected(info: &ParticipantInfo) -> Self {
        Self::UserConnected {
            participant_id: info.id.clone(),
            display_name: info.display_name.clone(),
        }
    }

    pub fn user_disconnected(info: &ParticipantInfo) -> Self {
        Self::UserDisconnected {
            participant_id: info.id.clone(),
            display_name: info.display_name.clone(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
