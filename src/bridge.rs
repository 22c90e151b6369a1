//! Highlight worker bridge
//!
//! The seam between the UI and the highlighting pipeline. The UI hands
//! the bridge a raw snippet string; the bridge runs detection, parsing
//! and rendering on a background worker thread and resolves the caller's
//! ticket with structured per-line HTML.
//!
//! Responsibilities, in order of appearance:
//! - serialize requests with monotonically increasing [`RequestId`]s
//! - correlate asynchronous worker responses to pending callers
//! - discard stale responses once a newer request supersedes them
//! - resolve with an escaped plain-text fallback when the worker does not
//!   answer within the timeout, reports an error, or is not running
//!
//! ## Threads
//!
//! ```text
//! caller ── request ──► dispatcher ── job ──► worker (HighlightEngine)
//!    ▲                      │ pending map          │
//!    └───── ticket ◄────────┴──────── done ◄───────┘
//! ```
//!
//! The dispatcher owns the pending map; the worker owns the engine
//! (tree-sitter parsers are !Sync). Both exit when the bridge drops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::HighlightConfig;
use crate::html::{self, HighlightedLine};
use crate::syntax::{HighlightEngine, LanguageId};

/// Monotonically increasing request identifier, unique per bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a result came from the fallback path instead of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The worker did not answer within the configured timeout
    Timeout,
    /// The worker answered with an engine error
    WorkerError,
    /// The worker is not running
    WorkerUnavailable,
}

/// Where a [`HighlightedText`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOrigin {
    /// Parsed and rendered by the worker
    Parsed,
    /// Escaped plain-text fallback
    Fallback(FallbackReason),
}

impl HighlightOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, HighlightOrigin::Fallback(_))
    }
}

/// The rendered result handed back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedText {
    /// Language the snippet was highlighted as (detected or hinted)
    pub language: LanguageId,
    /// Worker result or fallback
    pub origin: HighlightOrigin,
    /// Per-line HTML, 1-indexed line numbers
    pub lines: Vec<HighlightedLine>,
}

impl HighlightedText {
    /// Escaped plain rendering of `content`
    fn fallback(content: &str, reason: FallbackReason) -> Self {
        Self {
            language: LanguageId::PlainText,
            origin: HighlightOrigin::Fallback(reason),
            lines: html::plain_lines(content),
        }
    }
}

/// Terminal states of a ticket that carry no result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightError {
    /// A newer request superseded this one before it resolved
    Superseded,
    /// The bridge shut down before this request resolved
    BridgeClosed,
}

impl std::fmt::Display for HighlightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighlightError::Superseded => write!(f, "superseded by a newer request"),
            HighlightError::BridgeClosed => write!(f, "highlight bridge closed"),
        }
    }
}

impl std::error::Error for HighlightError {}

type Reply = Result<HighlightedText, HighlightError>;

/// Per-request handle. Resolves exactly once.
#[derive(Debug)]
pub struct HighlightTicket {
    id: RequestId,
    rx: Receiver<Reply>,
}

impl HighlightTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Block until the request resolves. The bridge's own timeout bounds
    /// the wait; a closed bridge resolves as `BridgeClosed`.
    pub fn wait(self) -> Reply {
        match self.rx.recv() {
            Ok(reply) => reply,
            Err(_) => Err(HighlightError::BridgeClosed),
        }
    }

    /// Non-blocking poll; None while the request is still in flight
    pub fn try_wait(&self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(HighlightError::BridgeClosed)),
        }
    }
}

/// Dispatcher-bound control messages
enum Control {
    Submit {
        id: RequestId,
        content: String,
        language: Option<LanguageId>,
        deadline: Instant,
        reply: Sender<Reply>,
    },
    WorkerDone {
        id: RequestId,
        result: Result<HighlightedText, String>,
    },
    Shutdown,
}

/// Worker-bound unit of work
struct Job {
    id: RequestId,
    content: String,
    language: Option<LanguageId>,
}

/// A registered request awaiting its worker response
struct Pending {
    /// Kept for the fallback rendering on timeout or worker error
    content: String,
    reply: Sender<Reply>,
    deadline: Instant,
}

/// Bridge between the UI thread and the highlight worker
pub struct HighlightBridge {
    control_tx: Sender<Control>,
    next_id: AtomicU64,
    timeout: Duration,
    dispatcher: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl HighlightBridge {
    /// Start the worker and dispatcher threads.
    ///
    /// If either thread cannot be spawned the bridge still functions:
    /// every request resolves synchronously with the escaped fallback.
    pub fn spawn(config: HighlightConfig) -> Self {
        let timeout = config.timeout();

        let (control_tx, control_rx) = mpsc::channel::<Control>();
        let (job_tx, job_rx) = mpsc::channel::<Job>();

        let worker = {
            let done_tx = control_tx.clone();
            std::thread::Builder::new()
                .name("pastelit-worker".to_string())
                .spawn(move || worker_loop(job_rx, done_tx))
                .map_err(|e| tracing::error!("Failed to spawn highlight worker: {}", e))
                .ok()
        };

        let dispatcher = std::thread::Builder::new()
            .name("pastelit-dispatch".to_string())
            .spawn(move || dispatch_loop(control_rx, job_tx))
            .map_err(|e| tracing::error!("Failed to spawn highlight dispatcher: {}", e))
            .ok();

        Self {
            control_tx,
            next_id: AtomicU64::new(0),
            timeout,
            dispatcher,
            worker,
        }
    }

    /// Submit a snippet for highlighting.
    ///
    /// Supersedes every request still pending on this bridge: their
    /// tickets resolve with `Err(Superseded)` and any late worker
    /// response for them is discarded.
    pub fn request(
        &self,
        content: impl Into<String>,
        language: Option<LanguageId>,
    ) -> HighlightTicket {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let content = content.into();
        let deadline = Instant::now() + self.timeout;
        let (reply_tx, reply_rx) = mpsc::channel();

        let submit = Control::Submit {
            id,
            content: content.clone(),
            language,
            deadline,
            reply: reply_tx.clone(),
        };

        if self.dispatcher.is_none() || self.control_tx.send(submit).is_err() {
            tracing::warn!("Highlight dispatcher unavailable, answering {} inline", id);
            let _ = reply_tx.send(Ok(HighlightedText::fallback(
                &content,
                FallbackReason::WorkerUnavailable,
            )));
        }

        HighlightTicket { id, rx: reply_rx }
    }

    /// Blocking convenience wrapper: submit and wait. Never fails; a
    /// superseded or closed ticket degrades to the plain fallback.
    pub fn highlight(&self, content: &str, language: Option<LanguageId>) -> HighlightedText {
        match self.request(content, language).wait() {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!("Blocking highlight resolved without result: {}", err);
                HighlightedText::fallback(content, FallbackReason::WorkerUnavailable)
            }
        }
    }

    /// Configured worker timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tear down both threads. Outstanding tickets resolve as
    /// `BridgeClosed`. Dropping the bridge does the same.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for HighlightBridge {
    fn drop(&mut self) {
        let _ = self.control_tx.send(Control::Shutdown);
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Worker thread: detection, parsing, rendering
fn worker_loop(job_rx: Receiver<Job>, done_tx: Sender<Control>) {
    let mut engine = HighlightEngine::new();

    while let Ok(job) = job_rx.recv() {
        let language = job
            .language
            .unwrap_or_else(|| LanguageId::detect(&job.content));

        let result = match engine.highlight(&job.content, language) {
            Ok(highlights) => {
                let lines = html::render_lines(&job.content, &highlights);
                tracing::debug!(
                    "Highlighted {} as {:?}: {} lines, {} tokens",
                    job.id,
                    language,
                    lines.len(),
                    highlights.token_count()
                );
                Ok(HighlightedText {
                    language,
                    origin: HighlightOrigin::Parsed,
                    lines,
                })
            }
            Err(e) => Err(e.to_string()),
        };

        if done_tx
            .send(Control::WorkerDone { id: job.id, result })
            .is_err()
        {
            break; // dispatcher gone
        }
    }
}

/// Dispatcher thread: pending map, supersession, timeouts
fn dispatch_loop(control_rx: Receiver<Control>, job_tx: Sender<Job>) {
    let mut pending: HashMap<RequestId, Pending> = HashMap::new();

    loop {
        // Wait until the next pending deadline, or indefinitely
        let message = match pending.values().map(|p| p.deadline).min() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match control_rx.recv_timeout(wait) {
                    Ok(msg) => Some(msg),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            None => match control_rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => return,
            },
        };

        match message {
            Some(Control::Submit {
                id,
                content,
                language,
                deadline,
                reply,
            }) => {
                // A new request supersedes everything still pending
                for (old_id, old) in pending.drain() {
                    tracing::debug!("Request {} superseded by {}", old_id, id);
                    let _ = old.reply.send(Err(HighlightError::Superseded));
                }

                let job = Job {
                    id,
                    content: content.clone(),
                    language,
                };

                if job_tx.send(job).is_err() {
                    tracing::warn!("Highlight worker gone, falling back for {}", id);
                    let _ = reply.send(Ok(HighlightedText::fallback(
                        &content,
                        FallbackReason::WorkerUnavailable,
                    )));
                    continue;
                }

                pending.insert(
                    id,
                    Pending {
                        content,
                        reply,
                        deadline,
                    },
                );
            }

            Some(Control::WorkerDone { id, result }) => {
                let Some(entry) = pending.remove(&id) else {
                    // Timed out or superseded while the worker was busy
                    tracing::debug!("Discarding stale highlight response for {}", id);
                    continue;
                };

                let reply = match result {
                    Ok(text) => Ok(text),
                    Err(err) => {
                        tracing::warn!("Worker error for {}: {}", id, err);
                        Ok(HighlightedText::fallback(
                            &entry.content,
                            FallbackReason::WorkerError,
                        ))
                    }
                };
                let _ = entry.reply.send(reply);
            }

            Some(Control::Shutdown) => return,

            // recv_timeout expired: resolve every overdue request
            None => {
                let now = Instant::now();
                let expired: Vec<RequestId> = pending
                    .iter()
                    .filter(|(_, p)| p.deadline <= now)
                    .map(|(id, _)| *id)
                    .collect();

                for id in expired {
                    if let Some(entry) = pending.remove(&id) {
                        tracing::warn!("Highlight request {} timed out, falling back", id);
                        let _ = entry.reply.send(Ok(HighlightedText::fallback(
                            &entry.content,
                            FallbackReason::Timeout,
                        )));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_increase() {
        let bridge = HighlightBridge::spawn(HighlightConfig::default());
        let a = bridge.request("fn main() {}", Some(LanguageId::Rust));
        let b = bridge.request("fn main() {}", Some(LanguageId::Rust));
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_fallback_shape() {
        let text = HighlightedText::fallback("x < y\n", FallbackReason::Timeout);
        assert_eq!(text.language, LanguageId::PlainText);
        assert!(text.origin.is_fallback());
        assert_eq!(text.lines.len(), 2);
        assert_eq!(text.lines[0].html, r#"<span class="line">x &lt; y</span>"#);
    }
}
