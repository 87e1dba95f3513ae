//! Single-slot rendezvous between the handler and the battle parser.
//!
//! The producing side ([`EventSender`]) hands over one event at a time and
//! gets back an [`Ack`] that resolves once the parser is done with that event,
//! which is when it asks for the next one or when it terminates. The consuming
//! side ([`EventReader`]) pulls events with [`peek`](EventReader::peek) and
//! [`next`](EventReader::next), suspending while the slot is empty.
//!
//! Either end can close ([`close`](EventSender::close)) or abort
//! ([`abort`](EventSender::abort)) the channel, which wakes the other end so
//! neither is left suspended.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use psai_protocol::Event;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("event channel is closed")]
    Closed,

    #[error("previous event has not been taken by the parser yet")]
    Busy,

    #[error("event channel aborted: {0}")]
    Aborted(String),
}

/// How the parser moved on from an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumed {
    /// Waiting for the next event
    Waiting,
    /// The parser will not take any more events
    Finished,
}

/// Resolves once the parser has moved on from a supplied event
#[derive(Debug)]
pub struct Ack(oneshot::Receiver<Resumed>);

impl Ack {
    /// An ack for an event the parser will never see
    pub fn finished() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Resumed::Finished);
        Self(rx)
    }

    pub async fn wait(self) -> Resumed {
        // A dropped reader counts as finished
        self.0.await.unwrap_or(Resumed::Finished)
    }
}

impl std::future::Future for Ack {
    type Output = Resumed;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Resumed> {
        std::pin::Pin::new(&mut self.0)
            .poll(cx)
            .map(|r| r.unwrap_or(Resumed::Finished))
    }
}

enum Delivery {
    Event(Event, oneshot::Sender<Resumed>),
    Closed,
    Aborted(String),
}

#[derive(Default)]
struct Slot {
    /// Event supplied while nobody was waiting for it
    supplied: Option<(Event, oneshot::Sender<Resumed>)>,
    /// Reader suspended on an empty slot
    waiter: Option<oneshot::Sender<Delivery>>,
    /// An event was supplied and its ack has not fired yet
    unacked: bool,
    closed: bool,
    aborted: Option<String>,
    reader_gone: bool,
}

type Shared = Arc<Mutex<Slot>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Slot> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a connected sender/reader pair
pub fn channel() -> (EventSender, EventReader) {
    let shared = Shared::default();
    (
        EventSender {
            shared: shared.clone(),
        },
        EventReader {
            shared,
            buffer: None,
            held_ack: None,
            consumed: 0,
            done: false,
        },
    )
}

/// Producer end of the channel
pub struct EventSender {
    shared: Shared,
}

impl EventSender {
    /// Hand one event to the parser.
    ///
    /// Fails with [`ChannelError::Busy`] while the previous event is unacked.
    pub fn supply(&self, event: Event) -> Result<Ack, ChannelError> {
        let mut slot = lock(&self.shared);
        if let Some(reason) = &slot.aborted {
            return Err(ChannelError::Aborted(reason.clone()));
        }
        if slot.closed || slot.reader_gone {
            return Err(ChannelError::Closed);
        }
        if slot.unacked {
            return Err(ChannelError::Busy);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        slot.unacked = true;
        match slot.waiter.take() {
            Some(waiter) => {
                if let Err(Delivery::Event(event, ack_tx)) =
                    waiter.send(Delivery::Event(event, ack_tx))
                {
                    // The reader stopped waiting; keep the event for its next pull
                    slot.supplied = Some((event, ack_tx));
                }
            }
            None => slot.supplied = Some((event, ack_tx)),
        }
        Ok(Ack(ack_rx))
    }

    /// End of stream: the parser sees no more events
    pub fn close(&self) {
        let mut slot = lock(&self.shared);
        slot.closed = true;
        if let Some(waiter) = slot.waiter.take() {
            let _ = waiter.send(Delivery::Closed);
        }
    }

    /// Cancel the parser: its pending and future pulls fail with `reason`
    pub fn abort(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut slot = lock(&self.shared);
        if slot.aborted.is_none() {
            slot.aborted = Some(reason.clone());
        }
        if let Some(waiter) = slot.waiter.take() {
            let _ = waiter.send(Delivery::Aborted(reason));
        }
    }

    /// Whether the reader has terminated
    pub fn is_finished(&self) -> bool {
        lock(&self.shared).reader_gone
    }

    /// Why the channel was aborted, from whichever end did it first
    pub fn abort_reason(&self) -> Option<String> {
        lock(&self.shared).aborted.clone()
    }
}

/// Consumer end of the channel, owned by the parser
pub struct EventReader {
    shared: Shared,
    /// Event taken from the slot but not consumed yet
    buffer: Option<Event>,
    /// Ack of the last event taken from the slot
    held_ack: Option<oneshot::Sender<Resumed>>,
    consumed: u64,
    done: bool,
}

impl EventReader {
    /// The next event without consuming it, `None` at end of stream.
    ///
    /// Repeated calls return the same event until [`next`](Self::next).
    pub async fn peek(&mut self) -> Result<Option<&Event>, ChannelError> {
        if self.buffer.is_none() {
            self.fetch().await?;
        }
        Ok(self.buffer.as_ref())
    }

    /// Consume the next event, `None` at end of stream
    pub async fn next(&mut self) -> Result<Option<Event>, ChannelError> {
        if self.buffer.is_none() {
            self.fetch().await?;
        }
        let event = self.buffer.take();
        if event.is_some() {
            self.consumed += 1;
        }
        Ok(event)
    }

    /// Number of events consumed so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Terminate from the consumer side: the producer's acks resolve and
    /// further supplies fail with `reason`
    pub fn abort(&mut self, reason: impl Into<String>) {
        lock(&self.shared).aborted.get_or_insert_with(|| reason.into());
        self.terminate();
    }

    async fn fetch(&mut self) -> Result<(), ChannelError> {
        if self.done {
            return Ok(());
        }
        // The previous event was consumed, so the producer may go on
        self.release();

        let rx = {
            let mut slot = lock(&self.shared);
            if let Some((event, ack)) = slot.supplied.take() {
                self.buffer = Some(event);
                self.held_ack = Some(ack);
                return Ok(());
            }
            if let Some(reason) = &slot.aborted {
                return Err(ChannelError::Aborted(reason.clone()));
            }
            if slot.closed {
                self.done = true;
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            slot.waiter = Some(tx);
            rx
        };

        match rx.await {
            Ok(Delivery::Event(event, ack)) => {
                self.buffer = Some(event);
                self.held_ack = Some(ack);
                Ok(())
            }
            Ok(Delivery::Closed) => {
                self.done = true;
                Ok(())
            }
            Ok(Delivery::Aborted(reason)) => Err(ChannelError::Aborted(reason)),
            Err(_) => Err(ChannelError::Closed),
        }
    }

    fn release(&mut self) {
        if let Some(ack) = self.held_ack.take() {
            lock(&self.shared).unacked = false;
            let _ = ack.send(Resumed::Waiting);
        }
    }

    fn terminate(&mut self) {
        let mut slot = lock(&self.shared);
        slot.reader_gone = true;
        slot.unacked = false;
        slot.waiter = None;
        if let Some((_, ack)) = slot.supplied.take() {
            let _ = ack.send(Resumed::Finished);
        }
        if let Some(ack) = self.held_ack.take() {
            let _ = ack.send(Resumed::Finished);
        }
        self.done = true;
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.terminate();
    }
}
