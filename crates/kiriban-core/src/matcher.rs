//! Pure decision logic: the effect of one inbound message on one session.

use crate::{
    messaging::types::InboundMessage,
    session::{CapturedEntry, ChannelSession},
    Error, Result,
};

/// How a session derives its running count from the message stream.
///
/// The two policies provide materially different contracts, so they are a
/// configured strategy rather than two branches buried in one function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discipline {
    /// Every non-bot message in the bound chat increments the count by one,
    /// regardless of content.
    Counting,
    /// A message whose trimmed content parses as a non-negative integer sets
    /// the count to that value. Anything else is ignored outright. A later
    /// smaller number may rewind the count toward an already-passed target.
    NumericParse,
}

impl Discipline {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "counting" => Ok(Self::Counting),
            "numeric" => Ok(Self::NumericParse),
            other => Err(Error::Config(format!(
                "unknown discipline {other:?} (expected \"counting\" or \"numeric\")"
            ))),
        }
    }
}

/// Outcome of one matching step.
#[derive(Clone, Debug)]
pub enum MatchOutcome {
    /// The message was not eligible (bot author, wrong chat, or non-numeric
    /// content under the numeric-parse discipline).
    NoEffect,
    /// The count changed but no target was hit.
    Advanced { count: u64 },
    /// The smallest pending target was hit; more targets remain.
    Hit { target: u64, entry: CapturedEntry },
    /// The hit closed out the final pending target.
    Completed {
        target: u64,
        entry: CapturedEntry,
        fixed: Vec<(u64, CapturedEntry)>,
    },
}

/// Apply one inbound message to one session.
///
/// Matching is evaluated in arrival order and at most one target can be hit
/// per message: only the smallest pending target is checked, even if the
/// count could coincide with a later one.
pub fn observe(
    session: &mut ChannelSession,
    discipline: Discipline,
    msg: &InboundMessage,
) -> MatchOutcome {
    if msg.is_bot || msg.chat_id != session.chat_id {
        return MatchOutcome::NoEffect;
    }

    match discipline {
        Discipline::Counting => session.count += 1,
        Discipline::NumericParse => {
            let Ok(value) = msg.text.trim().parse::<u64>() else {
                return MatchOutcome::NoEffect;
            };
            session.count = value;
        }
    }

    let Some(next) = session.next_target() else {
        return MatchOutcome::Advanced {
            count: session.count,
        };
    };
    if session.count != next {
        return MatchOutcome::Advanced {
            count: session.count,
        };
    }

    let entry = CapturedEntry {
        author: msg.author.clone(),
        content: msg.text.clone(),
        message: msg.message_ref(),
    };
    session.fixed.push((next, entry.clone()));

    if session.is_complete() {
        MatchOutcome::Completed {
            target: next,
            entry,
            fixed: session.fixed.clone(),
        }
    } else {
        MatchOutcome::Hit {
            target: next,
            entry,
        }
    }
}
