//! Scaffolding for driving parsers in unit tests

use std::sync::Arc;

use psai_protocol::{ClientMessage, Event};
use tokio::sync::mpsc;
use tracing::Span;

use crate::agent::{BattleAgent, FirstChoiceAgent};
use crate::channel::{EventSender, Resumed, channel};
use crate::context::BattleContext;
use crate::sender::{ChoiceResolver, ChoiceSender};

pub(crate) struct TestBattle {
    pub ctx: BattleContext,
    pub resolver: ChoiceResolver,
    pub outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    sender: Option<EventSender>,
}

impl TestBattle {
    pub fn new() -> Self {
        Self::with_agent(Arc::new(FirstChoiceAgent))
    }

    pub fn with_agent(agent: Arc<dyn BattleAgent>) -> Self {
        let (sender, reader) = channel();
        let (tx, outgoing) = mpsc::unbounded_channel();
        let (choices, resolver) = ChoiceSender::new(tx, Some("battle-test-1".to_string()));
        Self {
            ctx: BattleContext::new(reader, agent, choices, Span::none()),
            resolver,
            outgoing,
            sender: Some(sender),
        }
    }

    /// Hand the context to a parser task, keeping the server's end
    pub fn split(
        self,
    ) -> (
        BattleContext,
        ChoiceResolver,
        mpsc::UnboundedReceiver<ClientMessage>,
    ) {
        (self.ctx, self.resolver, self.outgoing)
    }

    /// Feed `events` in the background, then close the stream
    pub fn supply(&mut self, events: Vec<Event>) {
        let sender = self.sender.take().expect("events already supplied");
        tokio::spawn(async move {
            for event in events {
                let Ok(ack) = sender.supply(event) else {
                    return;
                };
                if ack.wait().await != Resumed::Waiting {
                    return;
                }
            }
            sender.close();
        });
    }
}
