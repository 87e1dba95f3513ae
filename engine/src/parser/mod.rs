//! Building blocks for battle parsing routines

pub mod dispatch;
pub mod inference;
pub mod reason;
pub mod unordered;

pub use dispatch::{EventHandler, dispatch, expect, lookup, peek_tag};
pub use inference::{Acceptor, EventInference, InferenceParser, InferenceRoutine, SubInference};
pub use reason::{DelayHandle, Fact, ReasonError, ReasonGraph, ReasonId, Verdict};
pub use unordered::{BoxParser, ParserFactory, UnorderedParser, all, one_of, parse, staged};
