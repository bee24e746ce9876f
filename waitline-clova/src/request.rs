//! Inbound CEK (Clova Extension Kit) request types.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Slot carrying the store name in waiting intents.
pub const STORE_SLOT: &str = "Store";

/// Slot name → slot mapping attached to an intent.
pub type Slots = HashMap<String, Slot>;

/// A complete request body posted by the Clova platform.
#[derive(Debug, Clone, Deserialize)]
pub struct CekRequest {
    #[serde(default)]
    pub version: Option<String>,
    /// Device and user context. Only logged.
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub session: Session,
    pub request: RequestKind,
}

/// Session information sent with every request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// `true` on the first request of a session.
    #[serde(default)]
    pub new: Option<bool>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub user: Option<Value>,
}

impl Session {
    /// Whether this request continues an existing session.
    ///
    /// Only an explicit `"new": false` counts; a missing flag does not.
    pub fn is_continuation(&self) -> bool {
        self.new == Some(false)
    }
}

/// The `request` object, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RequestKind {
    #[serde(rename = "LaunchRequest")]
    Launch,
    #[serde(rename = "IntentRequest")]
    Intent { intent: Intent },
    #[serde(rename = "SessionEndedRequest")]
    SessionEnded,
    /// Any request type this extension does not handle.
    #[serde(other)]
    Unhandled,
}

impl RequestKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Launch => "LaunchRequest",
            Self::Intent { .. } => "IntentRequest",
            Self::SessionEnded => "SessionEndedRequest",
            Self::Unhandled => "unhandled",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    /// Missing names fall through to the guide.
    #[serde(default)]
    pub name: String,
    /// Absent (or `null`) when the utterance carried no slots at all.
    #[serde(default, deserialize_with = "lenient_slots")]
    pub slots: Option<Slots>,
}

/// Parse `slots` without ever failing the request.
///
/// Entries that are not objects are dropped, and a `slots` value that is not
/// an object reads as an empty slot map.
fn lenient_slots<'de, D>(deserializer: D) -> Result<Option<Slots>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(
            map.into_iter()
                .filter_map(|(name, slot)| Slot::from_value(&slot).map(|s| (name, s)))
                .collect(),
        ),
        Some(other) => {
            tracing::debug!(slots = %other, "Ignoring malformed intent slots");
            Some(Slots::new())
        }
    };
    Ok(slots)
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        IntentKind::from(self.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Slot {
    /// Read a slot object. Non-string fields read as absent.
    fn from_value(value: &Value) -> Option<Self> {
        let slot = value.as_object()?;
        let field = |key: &str| slot.get(key).and_then(Value::as_str).map(String::from);
        Some(Self {
            name: field("name"),
            value: field("value"),
        })
    }
}

/// Intents this extension answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    GetWaiting,
    PostWaiting,
    GetStores,
    /// `Clova.GuideIntent` and every intent not listed above.
    Guide,
}

impl From<&str> for IntentKind {
    fn from(name: &str) -> Self {
        match name {
            "GetWaitingIntent" => Self::GetWaiting,
            "PostWaitingIntent" => Self::PostWaiting,
            "GetStoresIntent" => Self::GetStores,
            _ => Self::Guide,
        }
    }
}
