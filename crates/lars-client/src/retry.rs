//! Transport retry for repository HTTP calls.
//!
//! A request that failed before any response arrived is sent again after
//! 200ms, 400ms and 800ms. HTTP error statuses are never retried here.
//! Requests that create something or advance the lifecycle are repeated
//! only when the connection itself failed: after a timeout the server may
//! already have acted, and a second POST would store a duplicate asset.

use std::time::Duration;

use reqwest::blocking::Response;

pub(crate) const MAX_RETRIES: u32 = 3;

const BASE_DELAY_MS: u64 = 200;

/// Whether a request may be sent again after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    /// Reads, full-document PUTs and deletes.
    Any,
    /// Creates and lifecycle actions: only when nothing reached the server.
    ConnectOnly,
}

impl Replay {
    fn allows(self, err: &reqwest::Error) -> bool {
        match self {
            Replay::Any => true,
            Replay::ConnectOnly => err.is_connect(),
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt)
}

/// `send` must build a fresh request per call; multipart bodies are
/// consumed by sending.
pub(crate) fn retry_send<F>(operation: &str, replay: Replay, send: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Result<Response, reqwest::Error>,
{
    let mut attempt = 0;
    loop {
        match send() {
            Err(e) if attempt < MAX_RETRIES && replay.allows(&e) => {
                let delay = backoff(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    "transport failure, resending in {delay:?}: {e}"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}
