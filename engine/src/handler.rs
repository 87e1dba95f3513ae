//! The handler: feeds a battle's events to its parser task and negotiates
//! the parser's choices with the server.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use psai_protocol::{BattleRequest, ClientMessage, Event, EventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info_span, trace, warn};

use crate::agent::BattleAgent;
use crate::channel::{Ack, ChannelError, EventSender, Resumed, channel};
use crate::config::HandlerConfig;
use crate::context::BattleContext;
use crate::error::EngineError;
use crate::rules::{BattleOutcome, parse_battle};
use crate::sender::{ChoiceResolver, ChoiceResult, ChoiceSender};

/// The routine a handler runs on its parser task
pub type ParserFn<T> = for<'a> fn(&'a mut BattleContext) -> BoxFuture<'a, Result<T>>;

const FORCED: &str = "battle forced to finish";

/// Which kind of choice the server said it couldn't take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unavailable {
    Move,
    Switch,
}

/// Drives one battle.
///
/// Events go in through [`handle`](Self::handle); requests are held back
/// until [`halt`](Self::halt) says the current batch of events is over, so
/// the parser decides with everything the server sent before it. Whether a
/// choice went through is learned from what the server sends next.
pub struct BattleHandler<T> {
    config: HandlerConfig,
    events: EventSender,
    choices: ChoiceResolver,
    parser: Option<JoinHandle<Result<T>>>,
    span: Span,

    battling: bool,
    /// Events were forwarded since the last halt
    progressed: bool,
    parser_done: bool,
    /// Request waiting for the next halt
    pending_request: Option<Event>,
    /// The request our last choice answered
    last_request: Option<BattleRequest>,
    /// Ack of the request the parser is deciding on
    decision: Option<Ack>,
    unavailable: Option<Unavailable>,
}

impl BattleHandler<BattleOutcome> {
    /// A handler running the full battle parser
    pub fn new(
        config: HandlerConfig,
        agent: Arc<dyn BattleAgent>,
        outgoing: mpsc::UnboundedSender<ClientMessage>,
        room_id: Option<String>,
    ) -> Self {
        Self::spawn(config, agent, outgoing, room_id, parse_battle)
    }
}

impl<T: Send + 'static> BattleHandler<T> {
    /// Start `parser` on its own task
    pub fn spawn(
        config: HandlerConfig,
        agent: Arc<dyn BattleAgent>,
        outgoing: mpsc::UnboundedSender<ClientMessage>,
        room_id: Option<String>,
        parser: ParserFn<T>,
    ) -> Self {
        let span = info_span!("battle", room = room_id.as_deref().unwrap_or_default());
        let (events, reader) = channel();
        let (sender, choices) = ChoiceSender::new(outgoing, room_id);
        let ctx = BattleContext::new(reader, agent, sender, span.clone());
        let parser = tokio::spawn(run_parser(ctx, parser).instrument(span.clone()));

        Self {
            config,
            events,
            choices,
            parser: Some(parser),
            span,
            battling: false,
            progressed: false,
            parser_done: false,
            pending_request: None,
            last_request: None,
            decision: None,
            unavailable: None,
        }
    }

    /// Take one event from the server.
    ///
    /// Progress events are handed to the parser, and this returns once the
    /// parser has moved past them. Fails if the parser failed on the event.
    pub async fn handle(&mut self, event: Event) -> Result<()> {
        if !is_relevant(&event) {
            return Ok(());
        }
        if self.parser_done {
            trace!(parent: &self.span, tag = %event.tag(), "parser is done, dropping event");
            return Ok(());
        }

        match &event.kind {
            EventKind::Request(None) => return Ok(()),
            EventKind::Request(Some(_)) => return self.handle_request(event),
            EventKind::Error(message) => {
                self.handle_error(message);
                return Ok(());
            }
            EventKind::Start => self.battling = true,
            EventKind::Win(_) | EventKind::Tie => self.battling = false,
            _ => {}
        }

        // The battle moved on, so whatever we chose went through
        self.choices.resolve(ChoiceResult::Accepted);
        self.settle_decision().await?;
        if self.parser_done {
            return Ok(());
        }
        self.forward(event).await
    }

    /// The current batch of events is over: hand the parser the request
    /// it should answer. Doesn't wait for the decision.
    pub fn halt(&mut self) -> Result<()> {
        if !self.battling || !self.progressed {
            return Ok(());
        }
        if self.decision.is_some() {
            return Err(EngineError::DecisionInFlight.into());
        }
        let Some(request) = self.pending_request.take() else {
            return Err(EngineError::NoPendingRequest.into());
        };

        if let EventKind::Request(Some(r)) = &request.kind {
            self.choices.set_rqid(r.rqid);
        }
        self.progressed = false;
        if self.parser_done {
            return Ok(());
        }
        self.decision = Some(self.supply(request)?);
        Ok(())
    }

    /// Close the event stream and wait for the parser's result
    pub async fn finish(mut self) -> Result<T> {
        if let Some(decision) = self.decision.take() {
            decision.wait().await;
        }
        self.events.close();

        let parser = self.parser.take().ok_or(EngineError::ParserLost)?;
        match parser.await {
            Ok(result) => result,
            Err(err) => Err(anyhow::Error::new(EngineError::ParserLost).context(err.to_string())),
        }
    }

    /// Cancel the parser and any choice in flight, then finish.
    ///
    /// `Ok(None)` if the parser was cut short.
    pub async fn force_finish(self) -> Result<Option<T>> {
        self.events.abort(FORCED);
        self.choices.cancel();
        match self.finish().await {
            Ok(output) => Ok(Some(output)),
            Err(err) if was_aborted(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn handle_request(&mut self, event: Event) -> Result<()> {
        let EventKind::Request(Some(request)) = &event.kind else {
            return Ok(());
        };

        // The server answered our unavailable choice with a corrected request
        if let Some(kind) = self.unavailable.take() {
            let result = match (kind, &self.last_request) {
                (Unavailable::Switch, Some(last)) if request.is_trapped() && !last.is_trapped() => {
                    ChoiceResult::Trapped
                }
                (Unavailable::Move, Some(last)) if newly_disabled(last, request) => {
                    ChoiceResult::Disabled
                }
                _ => ChoiceResult::Rejected,
            };
            self.choices.set_rqid(request.rqid);
            self.last_request = Some(request.as_ref().clone());
            self.choices.resolve(result);
            return Ok(());
        }

        if self.pending_request.is_some() {
            return Err(EngineError::DuplicateRequest.into());
        }
        self.choices.resolve(ChoiceResult::Accepted);
        self.last_request = Some(request.as_ref().clone());
        self.pending_request = Some(event);
        Ok(())
    }

    fn handle_error(&mut self, message: &str) {
        if let Some(rest) = message.strip_prefix("[Unavailable choice]") {
            let kind = if rest.contains("Can't switch") {
                Unavailable::Switch
            } else {
                Unavailable::Move
            };
            debug!(parent: &self.span, ?kind, "choice unavailable, waiting for new request");
            self.unavailable = Some(kind);
        } else if message.starts_with("[Invalid choice]") {
            debug!(parent: &self.span, %message, "choice rejected");
            self.choices.resolve(ChoiceResult::Rejected);
        } else {
            warn!(parent: &self.span, %message, "server error");
        }
    }

    /// Wait for the parser to finish deciding on the last request.
    ///
    /// The decision may still be with the agent, so each choice it sends in
    /// the meantime is taken as accepted.
    async fn settle_decision(&mut self) -> Result<()> {
        let Some(mut decision) = self.decision.take() else {
            return Ok(());
        };
        loop {
            self.choices.resolve(ChoiceResult::Accepted);
            let resumed = tokio::select! {
                resumed = &mut decision => Some(resumed),
                _ = self.choices.sent() => None,
            };
            if let Some(resumed) = resumed {
                return self.resumed(resumed);
            }
        }
    }

    async fn forward(&mut self, event: Event) -> Result<()> {
        if self.config.log_events {
            debug!(parent: &self.span, tag = %event.tag(), "event");
        }
        let ack = self.supply(event)?;
        self.progressed = true;
        let resumed = ack.await;
        self.resumed(resumed)
    }

    fn supply(&mut self, event: Event) -> Result<Ack> {
        match self.events.supply(event) {
            Ok(ack) => Ok(ack),
            Err(ChannelError::Closed) => {
                self.parser_done = true;
                Ok(Ack::finished())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn resumed(&mut self, resumed: Resumed) -> Result<()> {
        if resumed == Resumed::Finished {
            self.parser_done = true;
            if let Some(reason) = self.events.abort_reason() {
                return Err(ChannelError::Aborted(reason).into());
            }
        }
        Ok(())
    }
}

impl<T> Drop for BattleHandler<T> {
    fn drop(&mut self) {
        if self.parser.is_some() {
            self.events.abort("battle handler dropped");
        }
    }
}

async fn run_parser<T>(mut ctx: BattleContext, parser: ParserFn<T>) -> Result<T> {
    let result = parser(&mut ctx).await;
    if let Err(err) = &result {
        ctx.events.abort(format!("{err:#}"));
    }
    result.context("Battle parser failed")
}

/// Events the parser has no use for
fn is_relevant(event: &Event) -> bool {
    match &event.kind {
        EventKind::Other { .. } => false,
        // Struggle's activation message repeats what `|move|` already says
        EventKind::Activate { effect, .. } => effect != "move: Struggle",
        _ => true,
    }
}

/// A move the server now reports as disabled wasn't before
fn newly_disabled(last: &BattleRequest, now: &BattleRequest) -> bool {
    let (Some(last), Some(now)) = (last.first_active(), now.first_active()) else {
        return false;
    };
    now.moves.iter().any(|slot| {
        slot.disabled
            && last
                .moves
                .iter()
                .any(|old| old.id == slot.id && !old.disabled)
    })
}

fn was_aborted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ChannelError>(),
            Some(ChannelError::Aborted(_))
        )
    })
}
