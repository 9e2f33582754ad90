//! Transcript state machine: `Idle -> AwaitingReply -> Idle`.
//!
//! This module never touches the network. [`Conversation::submit`] hands back a
//! [`PendingRequest`] for the caller to run, and the caller reports the result
//! through [`Conversation::resolve`].

use crate::error::FailureKind;
use crate::persona::{build_prompt, QuickAsk};

/// Text of the placeholder shown while a reply is on its way.
pub const PENDING_TEXT: &str = "typing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEntry {
    User { text: String },
    Assistant { text: String, pending: bool },
}

impl ChatEntry {
    pub fn text(&self) -> &str {
        match self {
            ChatEntry::User { text } | ChatEntry::Assistant { text, .. } => text,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ChatEntry::Assistant { pending: true, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply { request: RequestId },
}

/// A completion call the caller must now run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Failed(FailureKind),
}

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl InputBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    persona: String,
    entries: Vec<ChatEntry>,
    input: InputBuffer,
    started: bool,
    phase: Phase,
    next_request: u64,
}

impl Conversation {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            entries: Vec::new(),
            input: InputBuffer::default(),
            started: false,
            phase: Phase::Idle,
            next_request: 0,
        }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_request_in_flight(&self) -> bool {
        matches!(self.phase, Phase::AwaitingReply { .. })
    }

    /// Queue `text` as the next visitor turn.
    ///
    /// Returns `None` and leaves every field untouched when the text is blank
    /// or a reply is still outstanding.
    pub fn submit(&mut self, text: &str) -> Option<PendingRequest> {
        if text.trim().is_empty() || self.is_request_in_flight() {
            return None;
        }

        self.started = true;
        self.entries.push(ChatEntry::User {
            text: text.to_string(),
        });
        self.input.clear();

        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.phase = Phase::AwaitingReply { request: id };
        self.entries.push(ChatEntry::Assistant {
            text: PENDING_TEXT.to_string(),
            pending: true,
        });

        Some(PendingRequest {
            id,
            prompt: build_prompt(&self.persona, text),
        })
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_input(&mut self) -> Option<PendingRequest> {
        let text = self.input.as_str().to_string();
        self.submit(&text)
    }

    pub fn quick_ask(&mut self, ask: QuickAsk) -> Option<PendingRequest> {
        self.submit(ask.prompt())
    }

    /// Settle the outstanding request. Stale ids are ignored.
    ///
    /// Returns whether the transcript was touched.
    pub fn resolve(&mut self, id: RequestId, outcome: Outcome) -> bool {
        match self.phase {
            Phase::AwaitingReply { request } if request == id => {}
            _ => return false,
        }
        self.phase = Phase::Idle;

        let text = match outcome {
            Outcome::Reply(text) => text,
            Outcome::Failed(kind) => kind.message().to_string(),
        };

        match self.entries.last_mut() {
            Some(last) if last.is_pending() => {
                *last = ChatEntry::Assistant {
                    text,
                    pending: false,
                };
                true
            }
            _ => {
                tracing::warn!("resolved request had no pending entry");
                false
            }
        }
    }
}
