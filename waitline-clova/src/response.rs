//! Outbound CEK response builder.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// CEK response protocol version.
pub const RESPONSE_VERSION: &str = "0.1.0";

/// Language tag used for spoken text.
pub const DEFAULT_LANG: &str = "ko";

/// Kind of a single speech item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeechKind {
    PlainText,
    /// Audio file played back instead of synthesized text
    #[serde(rename = "URL")]
    Url,
}

/// One spoken item: `{ "type": "PlainText", "lang": "ko", "value": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechItem {
    #[serde(rename = "type")]
    pub kind: SpeechKind,
    pub lang: String,
    pub value: String,
}

impl SpeechItem {
    /// Korean plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::plain_with_lang(DEFAULT_LANG, text)
    }

    pub fn plain_with_lang(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: SpeechKind::PlainText,
            lang: lang.into(),
            value: text.into(),
        }
    }

    /// Audio URL. CEK expects an empty language for URL items.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: SpeechKind::Url,
            lang: String::new(),
            value: url.into(),
        }
    }
}

impl From<&str> for SpeechItem {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for SpeechItem {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

/// Output speech of a response.
///
/// Serialized as `{}` when empty, `{type: "SimpleSpeech", values: item}` for a
/// single item and `{type: "SpeechList", values: [items]}` for a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSpeech {
    #[default]
    Empty,
    Simple(SpeechItem),
    List(Vec<SpeechItem>),
}

impl OutputSpeech {
    /// Append an item, promoting a single item to the head of a new list.
    pub fn push(&mut self, item: SpeechItem) {
        match std::mem::take(self) {
            Self::Empty => *self = Self::List(vec![item]),
            Self::Simple(first) => *self = Self::List(vec![first, item]),
            Self::List(mut items) => {
                items.push(item);
                *self = Self::List(items);
            }
        }
    }

    /// All spoken items in order.
    pub fn items(&self) -> &[SpeechItem] {
        match self {
            Self::Empty => &[],
            Self::Simple(item) => std::slice::from_ref(item),
            Self::List(items) => items,
        }
    }
}

impl Serialize for OutputSpeech {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_map(Some(0))?.end(),
            Self::Simple(item) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "SimpleSpeech")?;
                map.serialize_entry("values", item)?;
                map.end()
            }
            Self::List(items) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "SpeechList")?;
                map.serialize_entry("values", items)?;
                map.end()
            }
        }
    }
}

/// A directive attached to the response.
#[derive(Debug, Clone, Serialize)]
pub struct Directive {
    pub header: DirectiveHeader,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveHeader {
    pub message_id: String,
    pub namespace: String,
    pub name: String,
}

impl Directive {
    /// Create a directive with a fresh message ID.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, payload: Value) -> Self {
        Self {
            header: DirectiveHeader {
                message_id: uuid::Uuid::new_v4().to_string(),
                namespace: namespace.into(),
                name: name.into(),
            },
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    directives: Vec<Directive>,
    should_end_session: bool,
    output_speech: OutputSpeech,
    card: Map<String, Value>,
}

/// Builder for one CEK response; serializes to the reply body directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CekResponse {
    version: &'static str,
    session_attributes: Map<String, Value>,
    response: ResponseBody,
}

impl Default for CekResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl CekResponse {
    /// A response that ends the session and says nothing.
    pub fn new() -> Self {
        Self {
            version: RESPONSE_VERSION,
            session_attributes: Map::new(),
            response: ResponseBody {
                directives: Vec::new(),
                should_end_session: true,
                output_speech: OutputSpeech::Empty,
                card: Map::new(),
            },
        }
    }

    /// Replace the output speech with a single Korean plain-text item.
    pub fn set_simple_speech_text(&mut self, text: impl Into<String>) {
        self.response.output_speech = OutputSpeech::Simple(SpeechItem::plain(text));
    }

    /// Append a raw string (spoken as Korean plain text) or a prepared item.
    pub fn append_speech(&mut self, item: impl Into<SpeechItem>) {
        self.response.output_speech.push(item.into());
    }

    /// Keep listening after this reply, merging `attributes` into the
    /// session attributes. Incoming keys overwrite existing ones.
    pub fn set_multiturn(&mut self, attributes: Map<String, Value>) {
        self.response.should_end_session = false;
        self.session_attributes.extend(attributes);
    }

    /// End the session and drop all session attributes.
    pub fn clear_multiturn(&mut self) {
        self.response.should_end_session = true;
        self.session_attributes.clear();
    }

    pub fn add_directive(&mut self, directive: Directive) {
        self.response.directives.push(directive);
    }

    pub fn should_end_session(&self) -> bool {
        self.response.should_end_session
    }

    pub fn session_attributes(&self) -> &Map<String, Value> {
        &self.session_attributes
    }

    pub fn output_speech(&self) -> &OutputSpeech {
        &self.response.output_speech
    }

    pub fn directives(&self) -> &[Directive] {
        &self.response.directives
    }

    /// Text of the first spoken item, if any.
    pub fn speech_text(&self) -> Option<&str> {
        self.output_speech().items().first().map(|i| i.value.as_str())
    }
}
