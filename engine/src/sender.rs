use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use psai_protocol::{Choice, ClientCommand, ClientMessage};
use tokio::sync::{Notify, mpsc, oneshot};

use crate::channel::ChannelError;
use crate::error::EngineError;

/// What became of a choice sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceResult {
    Accepted,
    /// Rejected with no further information
    Rejected,
    /// The move turned out to be disabled
    Disabled,
    /// Switching turned out to be blocked by a trapping effect
    Trapped,
}

#[derive(Default)]
struct Outstanding {
    resolver: Option<oneshot::Sender<ChoiceResult>>,
    rqid: Option<u64>,
    cancelled: bool,
}

#[derive(Default)]
struct Shared {
    outstanding: Mutex<Outstanding>,
    sent: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Outstanding> {
        self.outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sends choices to the server and waits for the handler to learn whether
/// they went through.
///
/// Cloneable; at most one choice can be waiting for a result at a time.
#[derive(Clone)]
pub struct ChoiceSender {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    room_id: Option<String>,
    shared: Arc<Shared>,
}

impl ChoiceSender {
    pub(crate) fn new(
        outgoing: mpsc::UnboundedSender<ClientMessage>,
        room_id: Option<String>,
    ) -> (Self, ChoiceResolver) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                outgoing,
                room_id,
                shared: shared.clone(),
            },
            ChoiceResolver { shared },
        )
    }

    /// Send a choice and wait for its result
    pub async fn send(&self, choice: Choice) -> Result<ChoiceResult> {
        let (tx, rx) = oneshot::channel();
        let rqid = {
            let mut outstanding = self.shared.lock();
            if outstanding.cancelled {
                return Err(abandoned());
            }
            if outstanding.resolver.is_some() {
                return Err(EngineError::ChoiceOutstanding.into());
            }
            outstanding.resolver = Some(tx);
            outstanding.rqid
        };

        tracing::debug!(%choice, ?rqid, "sending choice");
        self.outgoing
            .send(ClientMessage {
                room_id: self.room_id.clone(),
                command: ClientCommand::Choose {
                    choice: choice.to_string(),
                    rqid,
                },
            })
            .map_err(|_| anyhow!("Transport closed"))?;
        self.shared.sent.notify_one();

        rx.await.map_err(|_| abandoned())
    }
}

fn abandoned() -> anyhow::Error {
    ChannelError::Aborted("choice abandoned".to_string()).into()
}

/// The handler's side of a [`ChoiceSender`]
pub(crate) struct ChoiceResolver {
    shared: Arc<Shared>,
}

impl ChoiceResolver {
    /// Resolve the outstanding choice, if any
    pub fn resolve(&self, result: ChoiceResult) -> bool {
        let resolver = self.shared.lock().resolver.take();
        match resolver {
            Some(tx) => {
                tracing::debug!(?result, "choice resolved");
                tx.send(result).is_ok()
            }
            None => false,
        }
    }

    /// Request id attached to the next choices
    pub fn set_rqid(&self, rqid: Option<u64>) {
        self.shared.lock().rqid = rqid;
    }

    /// Wait until a choice has been sent
    pub async fn sent(&self) {
        self.shared.sent.notified().await
    }

    /// Abandon the outstanding choice and refuse further ones
    pub fn cancel(&self) {
        let mut outstanding = self.shared.lock();
        outstanding.resolver = None;
        outstanding.cancelled = true;
    }
}
