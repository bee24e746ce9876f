//! Request dispatch: turns a CEK request into spoken text and session control.

use serde_json::Map;
use std::sync::Arc;
use waitline_common::config::{ClovaConfig, ResponsesConfig};

use crate::request::{CekRequest, IntentKind, RequestKind, Session, Slots, STORE_SLOT};
use crate::response::CekResponse;
use crate::waiting::{WaitingRegistry, UNKNOWN_STORE};

/// What the reply does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    /// Keep listening for a follow-up utterance.
    Multiturn,
    /// End the session and drop its attributes.
    Close,
    /// Leave the response default (session ends).
    Unchanged,
}

/// Outcome of interpreting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub session: SessionControl,
}

/// Store slot as found in an intent.
enum StoreSlot<'a> {
    /// The intent had no slots at all.
    NoSlots,
    /// Slots were sent but none named a store.
    Missing,
    Named(&'a str),
}

impl<'a> StoreSlot<'a> {
    /// The store name is trimmed before use, so it is also the registry key.
    /// An empty or whitespace-only value counts as no store.
    fn from_slots(slots: Option<&'a Slots>) -> Self {
        let Some(slots) = slots else {
            return Self::NoSlots;
        };

        match slots
            .get(STORE_SLOT)
            .and_then(|slot| slot.value.as_deref())
            .map(str::trim)
        {
            Some(store) if !store.is_empty() => Self::Named(store),
            _ => Self::Missing,
        }
    }
}

/// Maps requests to response text, reading and updating waiting counts.
pub struct Interpreter {
    responses: ResponsesConfig,
    stores: Vec<String>,
    registry: Arc<WaitingRegistry>,
}

impl Interpreter {
    pub fn new(config: &ClovaConfig, registry: Arc<WaitingRegistry>) -> Self {
        Self {
            responses: config.responses.clone(),
            stores: config.stores.clone(),
            registry,
        }
    }

    pub fn registry(&self) -> &WaitingRegistry {
        &self.registry
    }

    pub fn stores(&self) -> &[String] {
        &self.stores
    }

    /// Interpret a request. Returns `None` for request types this extension
    /// does not handle, in which case the response is left untouched.
    pub fn interpret(&self, request: &RequestKind, session: &Session) -> Option<Reply> {
        match request {
            RequestKind::Launch => Some(Reply {
                text: self.responses.guide.clone(),
                session: SessionControl::Multiturn,
            }),
            RequestKind::Intent { intent } => {
                let kind = intent.kind();
                tracing::info!(intent = %intent.name, ?kind, "Handling intent");

                let slots = intent.slots.as_ref();
                let text = match kind {
                    IntentKind::GetWaiting => self.get_waiting(slots),
                    IntentKind::PostWaiting => self.post_waiting(slots),
                    IntentKind::GetStores => self.get_stores(),
                    IntentKind::Guide => self.responses.guide.clone(),
                };

                let session = if session.is_continuation() {
                    SessionControl::Multiturn
                } else {
                    SessionControl::Unchanged
                };
                Some(Reply { text, session })
            }
            RequestKind::SessionEnded => Some(Reply {
                text: self.responses.end.clone(),
                session: SessionControl::Close,
            }),
            RequestKind::Unhandled => None,
        }
    }

    /// Build the full response for a request.
    pub fn handle(&self, request: &CekRequest) -> CekResponse {
        tracing::info!(
            request_type = request.request.as_str(),
            session_id = request.session.session_id.as_deref().unwrap_or("-"),
            "CEK request"
        );
        tracing::debug!(context = %request.context, session = ?request.session, "CEK request details");

        let mut response = CekResponse::new();

        match self.interpret(&request.request, &request.session) {
            Some(reply) => {
                response.set_simple_speech_text(reply.text);
                match reply.session {
                    SessionControl::Multiturn => response.set_multiturn(Map::new()),
                    SessionControl::Close => response.clear_multiturn(),
                    SessionControl::Unchanged => {}
                }
            }
            None => tracing::warn!("Unhandled CEK request type, returning empty response"),
        }

        response
    }

    fn get_waiting(&self, slots: Option<&Slots>) -> String {
        match StoreSlot::from_slots(slots) {
            StoreSlot::NoSlots => self.responses.guide.clone(),
            StoreSlot::Missing => self.responses.no_store.clone(),
            StoreSlot::Named(store) => {
                let count = self.registry.waiting_count(store);
                if count == UNKNOWN_STORE {
                    tracing::info!(store = %store, "Waiting count requested for unknown store");
                    self.responses.unknown_store.clone()
                } else {
                    self.format_waiting(count)
                }
            }
        }
    }

    fn post_waiting(&self, slots: Option<&Slots>) -> String {
        match StoreSlot::from_slots(slots) {
            StoreSlot::NoSlots => self.responses.guide.clone(),
            StoreSlot::Missing => self.responses.no_store.clone(),
            StoreSlot::Named(store) => {
                self.registry.post_waiting(store);
                let count = self.registry.waiting_count(store);
                tracing::info!(store = %store, waiting = count, "Waiting registered");
                self.format_waiting(count)
            }
        }
    }

    fn get_stores(&self) -> String {
        let mut text = self.responses.stores_prefix.clone();
        for store in &self.stores {
            text.push_str(store);
            text.push_str(", ");
        }
        text.push_str(&self.responses.stores_suffix);
        text
    }

    fn format_waiting(&self, count: i64) -> String {
        format!(
            "{}{}{}",
            self.responses.waiting_prefix, count, self.responses.waiting_suffix
        )
    }
}
