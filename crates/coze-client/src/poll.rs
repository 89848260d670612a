//! Create-and-poll support for non-streaming chats.
//!
//! A chat created without streaming runs in the background; its result is
//! observed by retrieving snapshots until the status settles. The loop is an
//! explicit state machine:
//!
//! ```text
//! Submitted ──terminal──────────────▶ Terminal
//!     │
//!     ▼
//! Polling ──completed/failed/requires_action──▶ Terminal
//!     │
//!     └──elapsed ≥ timeout──▶ TimedOut
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::ChatApi;
use crate::error::{Error, Result};
use crate::types::{Chat, ChatRequest};

/// Default delay between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default overall deadline, measured from submission.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Time source for the polling loop.
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay before each status check.
    pub interval: Duration,
    /// Deadline measured from submission.
    pub timeout: Duration,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl PollOptions {
    /// Set the delay between status checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            clock: Arc::new(TokioClock::new()),
        }
    }
}

#[derive(Debug)]
enum PollState {
    Submitted,
    Polling(Chat),
    Terminal(Chat),
    TimedOut,
}

/// Whether polling stops at this snapshot.
fn settled(chat: &Chat) -> bool {
    chat.is_terminal() || chat.requires_action()
}

pub(crate) async fn create_and_poll(
    api: &ChatApi,
    request: &ChatRequest,
    options: &PollOptions,
) -> Result<Chat> {
    let clock = &options.clock;
    let started = clock.now();
    let mut polls = 0u32;
    let mut state = PollState::Submitted;

    loop {
        state = match state {
            PollState::Submitted => {
                let body = api.create(request).await?;
                let chat = body
                    .get("data")
                    .and_then(Chat::from_value)
                    .ok_or(Error::MissingData("data"))?;
                tracing::debug!(chat_id = %chat.id, status = %chat.status, "Chat submitted");

                // Only completion or failure short-circuit here.
                if chat.is_terminal() {
                    PollState::Terminal(chat)
                } else {
                    PollState::Polling(chat)
                }
            }

            PollState::Polling(chat) => {
                if clock.now().saturating_sub(started) >= options.timeout {
                    PollState::TimedOut
                } else {
                    clock.sleep(options.interval).await;
                    polls += 1;

                    let body = api.retrieve(&chat.conversation_id, &chat.id).await?;
                    match body.get("data").and_then(Chat::from_value) {
                        Some(next) if settled(&next) => PollState::Terminal(next),
                        Some(next) => {
                            tracing::debug!(chat_id = %next.id, status = %next.status, polls, "Chat still running");
                            PollState::Polling(next)
                        }
                        None => {
                            tracing::warn!(chat_id = %chat.id, polls, "Chat status response had no data, retrying");
                            PollState::Polling(chat)
                        }
                    }
                }
            }

            PollState::Terminal(chat) => {
                tracing::debug!(chat_id = %chat.id, status = %chat.status, polls, "Chat settled");
                return Ok(chat);
            }

            PollState::TimedOut => {
                tracing::warn!(polls, timeout_secs = options.timeout.as_secs(), "Chat polling timed out");
                return Err(Error::PollTimeout {
                    timeout: options.timeout,
                });
            }
        };
    }
}
