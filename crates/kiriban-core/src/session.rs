//! Per-chat session records and the in-memory store that owns them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    matcher::{self, Discipline, MatchOutcome},
    messaging::types::InboundMessage,
    Error, Result,
};

/// A target that has been matched to a specific message.
#[derive(Clone, Debug)]
pub struct CapturedEntry {
    pub author: String,
    pub content: String,
    pub message: MessageRef,
}

/// Live state of one game in one chat.
#[derive(Clone, Debug)]
pub struct ChannelSession {
    pub chat_id: ChatId,
    pub topic: String,
    /// Distinct positive integers, ascending. Fixed for the session lifetime.
    pub targets: Vec<u64>,
    pub count: u64,
    /// Hit targets in the order they were matched. Key set ⊆ `targets`.
    pub fixed: Vec<(u64, CapturedEntry)>,
    pub initiator: UserId,
    /// The session's own announcement message, used to thread hit replies.
    pub anchor: Option<MessageRef>,
    pub started_at: DateTime<Utc>,
}

impl ChannelSession {
    pub(crate) fn new(
        chat_id: ChatId,
        topic: String,
        targets: Vec<u64>,
        initiator: UserId,
    ) -> Self {
        Self {
            chat_id,
            topic,
            targets,
            count: 0,
            fixed: Vec::new(),
            initiator,
            anchor: None,
            started_at: Utc::now(),
        }
    }

    fn is_fixed(&self, n: u64) -> bool {
        self.fixed.iter().any(|(hit, _)| *hit == n)
    }

    /// Smallest target not yet matched.
    pub fn next_target(&self) -> Option<u64> {
        self.targets.iter().copied().find(|n| !self.is_fixed(*n))
    }

    /// Unmatched targets, ascending.
    pub fn remaining_targets(&self) -> Vec<u64> {
        self.targets
            .iter()
            .copied()
            .filter(|n| !self.is_fixed(*n))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.fixed.len() == self.targets.len()
    }
}

/// Parse a user-supplied target list.
///
/// Split on `,`, trim each token, parse as an integer, drop tokens that fail
/// to parse and non-positive values, sort ascending, deduplicate. An empty
/// result is a validation error, not a session.
pub fn parse_targets(raw: &str) -> Result<Vec<u64>> {
    let mut out: Vec<u64> = raw
        .split(',')
        .map(str::trim)
        .filter_map(|tok| tok.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
        .collect();
    out.sort_unstable();
    out.dedup();

    if out.is_empty() {
        return Err(Error::InvalidTargets(raw.to_string()));
    }
    Ok(out)
}

/// Everything the router needs after a completed session has been torn down.
#[derive(Clone, Debug)]
pub struct CompletedSession {
    pub topic: String,
    pub targets: Vec<u64>,
    pub fixed: Vec<(u64, CapturedEntry)>,
    pub anchor: Option<MessageRef>,
}

/// Effect of one inbound message on the store, with the context the router
/// needs to send replies after the store lock has been released.
#[derive(Clone, Debug)]
pub enum MessageEffect {
    None,
    Advanced {
        count: u64,
    },
    Hit {
        target: u64,
        entry: CapturedEntry,
        anchor: Option<MessageRef>,
    },
    Completed {
        target: u64,
        entry: CapturedEntry,
        session: CompletedSession,
    },
}

/// In-memory store of live sessions, at most one per chat.
///
/// All mutations happen under one lock hold, so completion and teardown are
/// atomic: a fully-matched session is never observable from outside.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, ChannelSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session, unconditionally replacing any existing one for the
    /// chat.
    pub async fn start(
        &self,
        chat_id: ChatId,
        topic: &str,
        targets: Vec<u64>,
        initiator: UserId,
    ) -> Result<()> {
        if targets.is_empty() {
            return Err(Error::InvalidTargets(String::new()));
        }
        let session = ChannelSession::new(chat_id, topic.to_string(), targets, initiator);
        self.sessions.lock().await.insert(chat_id, session);
        Ok(())
    }

    /// Remove the chat's session. Idempotent; returns whether one existed.
    pub async fn stop(&self, chat_id: ChatId) -> bool {
        self.sessions.lock().await.remove(&chat_id).is_some()
    }

    /// Read-only copy of the chat's session, if any.
    pub async fn snapshot(&self, chat_id: ChatId) -> Option<ChannelSession> {
        self.sessions.lock().await.get(&chat_id).cloned()
    }

    pub async fn initiator(&self, chat_id: ChatId) -> Option<UserId> {
        self.sessions
            .lock()
            .await
            .get(&chat_id)
            .map(|s| s.initiator)
    }

    /// Record the announcement message so hit replies can thread to it.
    pub async fn set_anchor(&self, chat_id: ChatId, anchor: MessageRef) {
        if let Some(session) = self.sessions.lock().await.get_mut(&chat_id) {
            session.anchor = Some(anchor);
        }
    }

    /// The atomic matching step: look up the chat's session, run the matcher,
    /// and on completion remove the record before the lock is released. No
    /// message arriving afterwards can be attributed to the finished session.
    pub async fn apply(&self, discipline: Discipline, msg: &InboundMessage) -> MessageEffect {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&msg.chat_id) else {
            return MessageEffect::None;
        };
        let anchor = session.anchor;

        match matcher::observe(session, discipline, msg) {
            MatchOutcome::NoEffect => MessageEffect::None,
            MatchOutcome::Advanced { count } => MessageEffect::Advanced { count },
            MatchOutcome::Hit { target, entry } => MessageEffect::Hit {
                target,
                entry,
                anchor,
            },
            MatchOutcome::Completed {
                target,
                entry,
                fixed,
            } => {
                let Some(done) = sessions.remove(&msg.chat_id) else {
                    return MessageEffect::None;
                };
                MessageEffect::Completed {
                    target,
                    entry,
                    session: CompletedSession {
                        topic: done.topic,
                        targets: done.targets,
                        fixed,
                        anchor: done.anchor,
                    },
                }
            }
        }
    }
}
