use psai_protocol::{Choice, EventTag};
use thiserror::Error;

/// Fatal conditions raised by the engine.
///
/// Choice rejections are not errors; they travel through
/// [`ChoiceResult`](crate::ChoiceResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("protocol desync: received a request while another one is still unconsumed")]
    DuplicateRequest,

    #[error("protocol desync: halted without a pending request")]
    NoPendingRequest,

    #[error("protocol desync: halted while a decision is still in flight")]
    DecisionInFlight,

    #[error("expected one of {expected:?} but got '{got}'")]
    UnexpectedEvent {
        expected: Vec<EventTag>,
        got: EventTag,
    },

    #[error("event stream ended while expecting {0:?}")]
    UnexpectedEnd(Vec<EventTag>),

    #[error("all choices exhausted; the last rejected choice was '{last}'")]
    ChoicesExhausted { last: Choice },

    #[error("parser '{0}' accepted an event without naming a reason")]
    UnjustifiedAccept(String),

    #[error("a choice is already waiting for a result")]
    ChoiceOutstanding,

    #[error("battle parser panicked or was cancelled")]
    ParserLost,
}
