//! Running a battle from raw server chunks

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{Stream, StreamExt};
use psai_protocol::{ClientMessage, EventKind, parse_block};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::info;

use crate::agent::BattleAgent;
use crate::config::DriverConfig;
use crate::handler::BattleHandler;
use crate::rules::BattleOutcome;

/// How a driven battle went
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BattleResult {
    pub winner: Option<String>,
    pub tie: bool,
    /// Cut short before anyone won
    pub truncated: bool,
    pub turns: u32,
}

impl From<BattleOutcome> for BattleResult {
    fn from(outcome: BattleOutcome) -> Self {
        Self {
            winner: outcome.winner,
            tie: outcome.tie,
            truncated: false,
            turns: outcome.turns,
        }
    }
}

/// Parses chunks as the server sends them and feeds them to a
/// [`BattleHandler`], halting after each chunk.
///
/// Choices come out of the receiver returned by [`new`](Self::new); getting
/// them to the server is up to the caller.
pub struct BattleDriver {
    config: DriverConfig,
    handler: BattleHandler<BattleOutcome>,
    turns: u32,
    ended: bool,
    truncated: bool,
}

impl BattleDriver {
    pub fn new(
        config: DriverConfig,
        agent: Arc<dyn BattleAgent>,
        room_id: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (outgoing, messages) = mpsc::unbounded_channel();
        let handler = BattleHandler::new(config.handler.clone(), agent, outgoing, room_id);
        let driver = Self {
            config,
            handler,
            turns: 0,
            ended: false,
            truncated: false,
        };
        (driver, messages)
    }

    /// Feed one chunk. Returns `false` once the battle takes no more.
    pub async fn feed(&mut self, chunk: &str) -> Result<bool> {
        if self.ended || self.truncated {
            return Ok(false);
        }

        let events = parse_block(chunk).context("Failed to parse battle chunk")?;
        for event in events {
            match &event.kind {
                EventKind::Turn(turn) if self.config.max_turns.is_some_and(|max| *turn > max) => {
                    info!(turn, "turn limit reached, truncating battle");
                    self.truncated = true;
                    return Ok(false);
                }
                EventKind::Turn(turn) => self.turns = *turn,
                EventKind::Win(_) | EventKind::Tie => self.ended = true,
                _ => {}
            }

            timeout(self.config.event_timeout, self.handler.handle(event))
                .await
                .context("Timed out handling battle event")??;
        }

        self.handler.halt()?;
        Ok(!self.ended)
    }

    /// Feed chunks until the battle ends or the stream does
    pub async fn run<S>(mut self, chunks: S) -> Result<BattleResult>
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut chunks = chunks;
        while let Some(chunk) = chunks.next().await {
            if !self.feed(&chunk).await? {
                break;
            }
        }
        self.finish().await
    }

    /// Collect the result. A battle that never ended is forced to.
    pub async fn finish(self) -> Result<BattleResult> {
        if self.ended {
            return Ok(self.handler.finish().await?.into());
        }

        let turns = self.turns;
        match self.handler.force_finish().await? {
            Some(outcome) => Ok(outcome.into()),
            None => Ok(BattleResult {
                winner: None,
                tie: false,
                truncated: true,
                turns,
            }),
        }
    }
}
