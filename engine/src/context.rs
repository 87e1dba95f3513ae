use std::sync::Arc;

use anyhow::Result;
use psai_battle::BattleState;
use tracing::Span;

use crate::agent::BattleAgent;
use crate::channel::EventReader;
use crate::parser::reason::{ReasonGraph, ReasonId, Verdict};
use crate::sender::ChoiceSender;

/// Everything a parsing routine works with. Owned by the parser task.
pub struct BattleContext {
    pub events: EventReader,
    pub state: BattleState,
    pub reasons: ReasonGraph<BattleState>,
    pub agent: Arc<dyn BattleAgent>,
    pub sender: ChoiceSender,
    /// The battle's span, handed to the agent as its logger
    pub span: Span,
}

impl BattleContext {
    pub fn new(
        events: EventReader,
        agent: Arc<dyn BattleAgent>,
        sender: ChoiceSender,
        span: Span,
    ) -> Self {
        Self {
            events,
            state: BattleState::new(),
            reasons: ReasonGraph::new(),
            agent,
            sender,
            span,
        }
    }

    pub fn assert(&mut self, reason: ReasonId) -> Result<()> {
        self.reasons.assert(reason, &mut self.state)
    }

    pub fn reject(&mut self, reason: ReasonId) -> Result<()> {
        self.reasons.reject(reason, &mut self.state)
    }

    pub fn verdict(&self, reason: ReasonId) -> Verdict {
        self.reasons.can_hold(reason, &self.state)
    }

    /// Let reasons catch up with state changes
    pub fn settle(&mut self) -> Result<()> {
        self.reasons.propagate(&mut self.state)
    }
}
