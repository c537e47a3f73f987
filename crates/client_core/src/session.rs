//! Single-worker chat session.
//!
//! All input goes through one bounded queue and is handled to completion,
//! typing delay and service calls included, before the next line is taken.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    dialogue::{DialogueController, DialogueStep},
    error::SubmitError,
    transcript::Message,
};

pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What to do with input submitted while an earlier message is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    #[default]
    Queue,
    Reject,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown overlap policy '{other}' (expected queue or reject)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub typing_delay: Duration,
    pub queue_capacity: usize,
    pub overlap: OverlapPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            typing_delay: DEFAULT_TYPING_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overlap: OverlapPolicy::Queue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    UserMessage(Message),
    Typing,
    BotMessage(Message),
    Idle,
}

pub struct ChatSession {
    input_tx: mpsc::Sender<String>,
    pending: Arc<AtomicUsize>,
    overlap: OverlapPolicy,
    controller: Arc<Mutex<DialogueController>>,
    events: broadcast::Sender<ChatEvent>,
    worker: JoinHandle<()>,
}

impl ChatSession {
    /// Starts the worker task; must be called inside a tokio runtime.
    pub fn spawn(controller: DialogueController, options: SessionOptions) -> Self {
        let (input_tx, input_rx) = mpsc::channel(options.queue_capacity.max(1));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let controller = Arc::new(Mutex::new(controller));
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = tokio::spawn(run_worker(
            input_rx,
            controller.clone(),
            events.clone(),
            pending.clone(),
            options.typing_delay,
        ));

        Self {
            input_tx,
            pending,
            overlap: options.overlap,
            controller,
            events,
            worker,
        }
    }

    /// Queues one line of user input. Blank lines are accepted and dropped.
    pub fn submit(&self, raw: impl Into<String>) -> Result<(), SubmitError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Ok(());
        }

        match self.overlap {
            OverlapPolicy::Reject => {
                if self
                    .pending
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    return Err(SubmitError::Busy);
                }
            }
            OverlapPolicy::Queue => {
                self.pending.fetch_add(1, Ordering::SeqCst);
            }
        }

        match self.input_tx.try_send(raw) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(SubmitError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(SubmitError::Closed)
            }
        }
    }

    /// True while any submitted line has not been answered yet.
    pub fn is_busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.controller.lock().await.transcript().messages().to_vec()
    }

    pub async fn step(&self) -> DialogueStep {
        self.controller.lock().await.step().clone()
    }

    /// Stops accepting input, lets the worker drain the queue, and waits for it.
    pub async fn close(self) {
        let ChatSession {
            input_tx, worker, ..
        } = self;
        drop(input_tx);
        if let Err(error) = worker.await {
            warn!(%error, "chat session worker ended abnormally");
        }
    }
}

async fn run_worker(
    mut input_rx: mpsc::Receiver<String>,
    controller: Arc<Mutex<DialogueController>>,
    events: broadcast::Sender<ChatEvent>,
    pending: Arc<AtomicUsize>,
    typing_delay: Duration,
) {
    while let Some(raw) = input_rx.recv().await {
        let recorded = controller.lock().await.record_input(&raw);
        if let Some(user_message) = recorded {
            let _ = events.send(ChatEvent::UserMessage(user_message));
            let _ = events.send(ChatEvent::Typing);
            if !typing_delay.is_zero() {
                tokio::time::sleep(typing_delay).await;
            }

            let reply = controller.lock().await.reply_to(&raw).await;
            let _ = events.send(ChatEvent::BotMessage(reply));
        }

        pending.fetch_sub(1, Ordering::SeqCst);
        let _ = events.send(ChatEvent::Idle);
    }
    debug!("chat session input queue closed");
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
