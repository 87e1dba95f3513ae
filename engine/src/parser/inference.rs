//! Groups of mutually exclusive explanations for one event.

use anyhow::Result;
use async_trait::async_trait;

use super::reason::{ReasonGraph, ReasonId, Verdict};
use super::unordered::UnorderedParser;
use crate::context::BattleContext;
use crate::error::EngineError;

/// One alternative explanation, made of reasons that hold together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubInference {
    reason: ReasonId,
}

impl SubInference {
    pub fn new<S>(graph: &mut ReasonGraph<S>, reasons: Vec<ReasonId>) -> Self {
        Self {
            reason: graph.and(reasons),
        }
    }

    /// The conjunction of this alternative's reasons
    pub fn reason(&self) -> ReasonId {
        self.reason
    }

    pub fn can_hold<S>(&self, graph: &ReasonGraph<S>, state: &S) -> Verdict {
        graph.can_hold(self.reason, state)
    }

    /// `true`: every reason holds. `false`: this alternative didn't happen,
    /// so one of its reasons is blamed once it's clear which.
    pub fn resolve<S>(&self, graph: &mut ReasonGraph<S>, state: &mut S, accept: bool) -> Result<()> {
        if accept {
            graph.assert(self.reason, state)
        } else {
            graph.reject(self.reason, state)
        }
    }
}

/// The possible causes of one event; at most one of them is credited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInference {
    cases: Vec<SubInference>,
    resolved: bool,
}

impl EventInference {
    pub fn new(cases: Vec<SubInference>) -> Self {
        Self {
            cases,
            resolved: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Credit case `index` and reject all of its siblings
    pub fn accept<S>(&mut self, graph: &mut ReasonGraph<S>, state: &mut S, index: usize) -> Result<()> {
        self.resolved = true;
        for (i, case) in self.cases.iter().enumerate() {
            case.resolve(graph, state, i == index)?;
        }
        Ok(())
    }

    /// The event never happened: none of the causes were there
    pub fn reject<S>(&mut self, graph: &mut ReasonGraph<S>, state: &mut S) -> Result<()> {
        self.resolved = true;
        for case in &self.cases {
            case.resolve(graph, state, false)?;
        }
        Ok(())
    }
}

/// Passed to an [`InferenceRoutine`], which must name the case that explains
/// an event before consuming it
#[derive(Debug)]
pub struct Acceptor {
    inference: EventInference,
    accepted: Option<usize>,
}

impl Acceptor {
    pub fn accept(&mut self, ctx: &mut BattleContext, index: usize) -> Result<()> {
        self.inference
            .accept(&mut ctx.reasons, &mut ctx.state, index)?;
        self.accepted = Some(index);
        Ok(())
    }
}

/// The parsing half of an inference parser
#[async_trait]
pub trait InferenceRoutine: Send {
    type Output: Send;

    /// Try to parse the events at the head of the stream, calling
    /// [`Acceptor::accept`] before consuming anything. `Ok(None)` if the head
    /// isn't explained by any case.
    async fn run(
        &mut self,
        ctx: &mut BattleContext,
        accept: &mut Acceptor,
    ) -> Result<Option<Self::Output>>;
}

/// An [`UnorderedParser`] whose acceptance credits one case of an
/// [`EventInference`]; if it is rejected, every case is rejected
pub struct InferenceParser<R> {
    name: String,
    acceptor: Acceptor,
    routine: R,
}

impl<R: InferenceRoutine> InferenceParser<R> {
    pub fn new(name: impl Into<String>, inference: EventInference, routine: R) -> Self {
        Self {
            name: name.into(),
            acceptor: Acceptor {
                inference,
                accepted: None,
            },
            routine,
        }
    }
}

#[async_trait]
impl<R: InferenceRoutine> UnorderedParser for InferenceParser<R> {
    type Output = R::Output;

    fn name(&self) -> &str {
        &self.name
    }

    async fn parse(&mut self, ctx: &mut BattleContext) -> Result<Option<R::Output>> {
        let output = self.routine.run(ctx, &mut self.acceptor).await?;
        if output.is_some() && self.acceptor.accepted.is_none() {
            return Err(EngineError::UnjustifiedAccept(self.name.clone()).into());
        }
        Ok(output)
    }

    fn reject(mut self: Box<Self>, ctx: &mut BattleContext) -> Result<()> {
        if self.acceptor.inference.is_resolved() {
            return Ok(());
        }
        tracing::trace!(parser = %self.name, "inference rejected");
        self.acceptor
            .inference
            .reject(&mut ctx.reasons, &mut ctx.state)
    }
}
