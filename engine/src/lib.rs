//! An event-driven battle engine for Pokemon Showdown.
//!
//! The engine reads a battle the way a player sees it and answers the
//! server's requests:
//!
//! - [`BattleHandler`] takes server events one at a time and forwards them to
//!   a parser task through a single-slot [channel], holding requests back
//!   until the events they follow have been parsed.
//! - The parser is built from [unordered parsers](parser::unordered)
//!   dispatched by event tag, with [inferences](parser::inference) that
//!   narrow down the opponent's hidden abilities and items.
//! - Choices are ranked by a [`BattleAgent`] and sent through a
//!   [`ChoiceSender`], which learns whether the server took them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use psai_engine::{BattleDriver, DriverConfig, RandomAgent};
//!
//! let (mut driver, mut outgoing) =
//!     BattleDriver::new(DriverConfig::default(), Arc::new(RandomAgent::new()), Some(room));
//!
//! while let Some(chunk) = connection.next_chunk().await {
//!     if !driver.feed(&chunk).await? {
//!         break;
//!     }
//!     while let Ok(message) = outgoing.try_recv() {
//!         connection.send(message.to_wire_format()).await?;
//!     }
//! }
//! let result = driver.finish().await?;
//! ```

pub mod agent;
pub mod channel;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod handler;
pub mod parser;
pub mod rules;
pub mod sender;

#[cfg(test)]
mod testing;

pub use agent::{BattleAgent, FirstChoiceAgent, FnAgent, RandomAgent};
pub use channel::{Ack, ChannelError, EventReader, EventSender, Resumed};
pub use config::{DriverConfig, HandlerConfig};
pub use context::BattleContext;
pub use driver::{BattleDriver, BattleResult};
pub use error::EngineError;
pub use handler::{BattleHandler, ParserFn};
pub use rules::BattleOutcome;
pub use sender::{ChoiceResult, ChoiceSender};

// Re-export the crates the public API is made of
pub use psai_battle;
pub use psai_protocol;
