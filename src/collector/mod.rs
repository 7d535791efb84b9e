//! Exactly-once collection of asynchronously produced results.
//!
//! A request (picker, camera, cropper) is represented by a [`Session`]. Item
//! producers, possibly running concurrently, report into the session with
//! [`Session::report_success`] and [`Session::report_failure`]. The session
//! delivers exactly one outcome to the caller's continuation:
//!
//! - **Single** mode resolves with the first reported item.
//! - **Multiple** mode resolves with all items, in arrival order, once the
//!   declared expected count is reached.
//! - Any failure rejects immediately and discards partial results.
//!
//! Reports arriving after the outcome was delivered are logged and ignored.
//!
//! ```rust
//! use cropping_picker::collector::{ResultCollector, SessionMode};
//! use cropping_picker::item::MediaItem;
//!
//! # async fn example() {
//! let collector = ResultCollector::new();
//! let (session, outcome) = collector.begin_channel(SessionMode::Multiple);
//! session.set_expected_count(2);
//! session.report_success(MediaItem::new("/tmp/a.jpg", 1, 1, "image/jpeg"));
//! session.report_success(MediaItem::new("/tmp/b.jpg", 1, 1, "image/jpeg"));
//! let payload = outcome.await.unwrap().unwrap();
//! assert_eq!(payload.len(), 2);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::error::{ErrorKind, PickerError, PickerResult};
use crate::item::{MediaItem, Payload};

/// Whether a session completes on its first item or on a declared count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Single,
    Multiple,
}

impl SessionMode {
    pub fn from_multiple(multiple: bool) -> Self {
        if multiple {
            Self::Multiple
        } else {
            Self::Single
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Pending,
    Resolved,
    Rejected,
}

/// What happens to a pending session when `begin()` starts a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// The superseded caller is never notified. Its continuation is dropped,
    /// which closes the receiver of a channel-based session.
    #[default]
    Silent,
    /// The superseded caller is rejected with [`ErrorKind::Superseded`].
    RejectPrevious,
}

type ResolveFn = Box<dyn FnOnce(Payload) + Send>;
type RejectFn = Box<dyn FnOnce(PickerError) + Send>;

enum Continuation {
    Callbacks { on_resolve: ResolveFn, on_reject: RejectFn },
    Channel(oneshot::Sender<PickerResult<Payload>>),
}

impl Continuation {
    fn deliver(self, outcome: PickerResult<Payload>) {
        match (self, outcome) {
            (Continuation::Callbacks { on_resolve, .. }, Ok(payload)) => on_resolve(payload),
            (Continuation::Callbacks { on_reject, .. }, Err(err)) => on_reject(err),
            (Continuation::Channel(tx), outcome) => {
                if tx.send(outcome).is_err() {
                    log::debug!("Result receiver dropped before delivery");
                }
            }
        }
    }
}

struct SessionState {
    expected_count: Option<usize>,
    completed_count: usize,
    results: Vec<MediaItem>,
    terminal: TerminalState,
    superseded: bool,
    continuation: Option<Continuation>,
}

/// One in-flight request awaiting a single terminal outcome.
///
/// Cloned `Arc<Session>` handles are given to every item producer. All
/// state changes happen under one mutex; the continuation itself is invoked
/// after the lock is released.
pub struct Session {
    id: u64,
    mode: SessionMode,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("expected_count", &state.expected_count)
            .field("completed_count", &state.completed_count)
            .field("terminal", &state.terminal)
            .field("superseded", &state.superseded)
            .finish()
    }
}

impl Session {
    fn new(id: u64, mode: SessionMode, continuation: Continuation) -> Self {
        Self {
            id,
            mode,
            state: Mutex::new(SessionState {
                expected_count: None,
                completed_count: 0,
                results: Vec::new(),
                terminal: TerminalState::Pending,
                superseded: false,
                continuation: Some(continuation),
            }),
        }
    }

    /// A session outside any collector, delivering through callbacks.
    pub fn with_callbacks(
        mode: SessionMode,
        on_resolve: impl FnOnce(Payload) + Send + 'static,
        on_reject: impl FnOnce(PickerError) + Send + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::new(
            0,
            mode,
            Continuation::Callbacks {
                on_resolve: Box::new(on_resolve),
                on_reject: Box::new(on_reject),
            },
        ))
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A panic inside the critical section leaves counters consistent
        // (no user code runs under the lock), so poisoning is ignored.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn terminal_state(&self) -> TerminalState {
        self.lock().terminal
    }

    pub fn is_pending(&self) -> bool {
        self.terminal_state() == TerminalState::Pending
    }

    pub fn is_superseded(&self) -> bool {
        self.lock().superseded
    }

    pub fn expected_count(&self) -> Option<usize> {
        self.lock().expected_count
    }

    pub fn completed_count(&self) -> usize {
        self.lock().completed_count
    }

    /// Declare how many successful reports complete a multiple-mode session.
    ///
    /// Reaching the count already (including `n == 0` for an empty
    /// selection) resolves immediately. Ignored once terminal, and ignored
    /// if `n` is below the number of items already collected.
    pub fn set_expected_count(&self, n: usize) {
        let delivery = {
            let mut state = self.lock();
            if !Self::accepts_reports(&state, self.id) {
                return;
            }
            if n < state.completed_count {
                log::warn!(
                    "Session {}: expected count {n} is below {} collected items, ignoring",
                    self.id,
                    state.completed_count
                );
                return;
            }
            state.expected_count = Some(n);
            if self.mode == SessionMode::Multiple && state.completed_count == n {
                let results = std::mem::take(&mut state.results);
                Self::finish(&mut state, TerminalState::Resolved)
                    .map(|c| (c, Payload::Multiple(results)))
            } else {
                None
            }
        };

        if let Some((c, payload)) = delivery {
            log::debug!("Session {} resolved with {n} item(s)", self.id);
            c.deliver(Ok(payload));
        }
    }

    /// Contribute one resolved item.
    pub fn report_success(&self, item: MediaItem) {
        let delivery = {
            let mut state = self.lock();
            if !Self::accepts_reports(&state, self.id) {
                return;
            }
            match self.mode {
                SessionMode::Single => Self::finish(&mut state, TerminalState::Resolved)
                    .map(|c| (c, Payload::Single(item))),
                SessionMode::Multiple => {
                    let Some(expected) = state.expected_count else {
                        log::warn!(
                            "Session {}: item reported before the expected count was declared, dropping it",
                            self.id
                        );
                        return;
                    };
                    if state.completed_count >= expected {
                        log::warn!(
                            "Session {}: item beyond expected count {expected}, dropping it",
                            self.id
                        );
                        return;
                    }
                    state.results.push(item);
                    state.completed_count += 1;
                    if state.completed_count == expected {
                        let results = std::mem::take(&mut state.results);
                        Self::finish(&mut state, TerminalState::Resolved)
                            .map(|c| (c, Payload::Multiple(results)))
                    } else {
                        None
                    }
                }
            }
        };

        if let Some((c, payload)) = delivery {
            log::debug!("Session {} resolved with {} item(s)", self.id, payload.len());
            c.deliver(Ok(payload));
        }
    }

    /// Reject the session, discarding any partial results.
    pub fn report_failure(&self, kind: ErrorKind, message: impl Into<String>) {
        self.reject(PickerError::new(kind, message));
    }

    /// Reject with an already-built error.
    pub fn reject(&self, err: PickerError) {
        let continuation = {
            let mut state = self.lock();
            if !Self::accepts_reports(&state, self.id) {
                return;
            }
            state.results.clear();
            Self::finish(&mut state, TerminalState::Rejected)
        };

        if let Some(c) = continuation {
            log::error!("Request rejected. {}", err.message);
            c.deliver(Err(err));
        }
    }

    /// Mark as superseded by a newer session. The continuation is dropped
    /// unless the policy wants the previous caller rejected.
    fn supersede(&self, policy: SupersedePolicy) {
        let continuation = {
            let mut state = self.lock();
            if state.terminal != TerminalState::Pending || state.superseded {
                return;
            }
            state.superseded = true;
            state.results.clear();
            state.continuation.take()
        };

        log::warn!("Session {} superseded by a newer request", self.id);
        if let (Some(c), SupersedePolicy::RejectPrevious) = (continuation, policy) {
            c.deliver(Err(PickerError::of(ErrorKind::Superseded)));
        }
    }

    fn accepts_reports(state: &SessionState, id: u64) -> bool {
        if state.superseded {
            log::warn!("Session {id}: skipping report, session was superseded");
            return false;
        }
        if state.terminal != TerminalState::Pending {
            log::warn!("Session {id}: skipping report, result already sent");
            return false;
        }
        true
    }

    fn finish(state: &mut SessionState, terminal: TerminalState) -> Option<Continuation> {
        state.terminal = terminal;
        state.continuation.take()
    }
}

/// Holds the current session of one adapter instance.
///
/// [`begin`](Self::begin) returns an explicit session handle; the
/// `report_*` methods on the collector forward to whichever session is
/// current, for producers that do not carry a handle.
#[derive(Debug)]
pub struct ResultCollector {
    policy: SupersedePolicy,
    next_id: AtomicU64,
    current: Mutex<Option<Arc<Session>>>,
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::with_policy(SupersedePolicy::default())
    }

    pub fn with_policy(policy: SupersedePolicy) -> Self {
        Self {
            policy,
            next_id: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> SupersedePolicy {
        self.policy
    }

    /// Start a session delivering through callbacks. Supersedes any
    /// pending session.
    pub fn begin(
        &self,
        mode: SessionMode,
        on_resolve: impl FnOnce(Payload) + Send + 'static,
        on_reject: impl FnOnce(PickerError) + Send + 'static,
    ) -> Arc<Session> {
        self.install(
            mode,
            Continuation::Callbacks {
                on_resolve: Box::new(on_resolve),
                on_reject: Box::new(on_reject),
            },
        )
    }

    /// Start a session whose outcome is awaited on a oneshot receiver.
    pub fn begin_channel(
        &self,
        mode: SessionMode,
    ) -> (Arc<Session>, oneshot::Receiver<PickerResult<Payload>>) {
        let (tx, rx) = oneshot::channel();
        (self.install(mode, Continuation::Channel(tx)), rx)
    }

    fn install(&self, mode: SessionMode, continuation: Continuation) -> Arc<Session> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(id, mode, continuation));
        let previous = self.lock_current().replace(Arc::clone(&session));

        if let Some(prev) = previous {
            prev.supersede(self.policy);
        }
        log::debug!("Session {id} started ({mode:?})");
        session
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Arc<Session>>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The most recently begun session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.lock_current().clone()
    }

    pub fn set_expected_count(&self, n: usize) {
        match self.current() {
            Some(s) => s.set_expected_count(n),
            None => log::warn!("Trying to set expected count but no request is active"),
        }
    }

    pub fn report_success(&self, item: MediaItem) {
        match self.current() {
            Some(s) => s.report_success(item),
            None => log::warn!("Trying to notify success but no request is active"),
        }
    }

    pub fn report_failure(&self, kind: ErrorKind, message: impl Into<String>) {
        match self.current() {
            Some(s) => s.report_failure(kind, message),
            None => log::warn!("Trying to notify failure but no request is active"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn item(name: &str) -> MediaItem {
        MediaItem::new(format!("/tmp/{name}.jpg"), 10, 10, "image/jpeg")
    }

    type Outcomes = Arc<Mutex<Vec<PickerResult<Payload>>>>;

    /// Begin a session whose outcomes are recorded, so double delivery is visible.
    fn recording(collector: &ResultCollector, mode: SessionMode) -> (Arc<Session>, Outcomes) {
        let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
        let ok = Arc::clone(&outcomes);
        let err = Arc::clone(&outcomes);
        let session = collector.begin(
            mode,
            move |p| ok.lock().unwrap().push(Ok(p)),
            move |e| err.lock().unwrap().push(Err(e)),
        );
        (session, outcomes)
    }

    // ── single mode ──────────────────────────────────────────────────

    #[test]
    fn single_first_report_wins() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Single);

        session.report_success(item("one"));
        session.report_success(item("two"));
        session.report_success(item("three"));

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0], Ok(Payload::Single(item("one"))));
        assert_eq!(session.terminal_state(), TerminalState::Resolved);
    }

    #[test]
    fn single_resolves_without_expected_count() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Single);
        session.report_success(item("a"));
        assert_eq!(outcomes.lock().unwrap().len(), 1);
        assert_eq!(session.expected_count(), None);
    }

    #[test]
    fn single_failure_after_success_ignored() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Single);
        session.report_success(item("a"));
        session.report_failure(ErrorKind::NoImageDataFound, "late");
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_ok());
    }

    // ── multiple mode ────────────────────────────────────────────────

    #[test]
    fn multiple_resolves_at_expected_count() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(3);

        session.report_success(item("a"));
        session.report_success(item("b"));
        assert!(outcomes.lock().unwrap().is_empty());
        assert_eq!(session.completed_count(), 2);

        session.report_success(item("c"));
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0],
            Ok(Payload::Multiple(vec![item("a"), item("b"), item("c")]))
        );
    }

    #[test]
    fn multiple_extra_reports_are_noops() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(1);
        session.report_success(item("a"));
        session.report_success(item("b"));
        session.report_failure(ErrorKind::Cancelled, "late");

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].as_ref().unwrap().len(), 1);
        assert_eq!(session.completed_count(), 1);
    }

    #[test]
    fn failure_discards_partial_results() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(2);
        session.report_success(item("one"));
        session.report_failure(ErrorKind::NoImageDataFound, "x");
        session.report_success(item("two"));

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        let err = outcomes[0].clone().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoImageDataFound);
        assert_eq!(err.message, "x");
        assert_eq!(session.terminal_state(), TerminalState::Rejected);
    }

    #[test]
    fn failure_before_any_success_rejects() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.report_failure(ErrorKind::Cancelled, ErrorKind::Cancelled.message());
        session.report_failure(ErrorKind::NoImageDataFound, "second");

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].clone().unwrap_err().kind, ErrorKind::Cancelled);
    }

    #[test]
    fn empty_selection_resolves_immediately() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        assert!(outcomes.lock().unwrap().is_empty());

        session.set_expected_count(0);
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0], Ok(Payload::Multiple(vec![])));
    }

    #[test]
    fn undeclared_count_stays_pending() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.report_success(item("a"));
        session.set_expected_count(1);

        assert!(outcomes.lock().unwrap().is_empty());
        assert!(session.is_pending());
        assert_eq!(session.completed_count(), 0);
    }

    #[test]
    fn expected_count_below_collected_is_ignored() {
        let collector = ResultCollector::new();
        let (session, _outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(3);
        session.report_success(item("a"));
        session.report_success(item("b"));
        session.set_expected_count(1);
        assert_eq!(session.expected_count(), Some(3));
    }

    #[test]
    fn lowering_expected_count_to_collected_resolves() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(3);
        session.report_success(item("a"));
        session.set_expected_count(1);
        assert_eq!(outcomes.lock().unwrap().len(), 1);
    }

    // ── concurrency ──────────────────────────────────────────────────

    #[test]
    fn concurrent_reports_collect_every_item_once() {
        const N: usize = 64;
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        session.set_expected_count(N);

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let s = Arc::clone(&session);
                thread::spawn(move || s.report_success(item(&i.to_string())))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        let items = outcomes[0].clone().unwrap().into_items();
        assert_eq!(items.len(), N);
        let mut paths: Vec<_> = items.iter().map(|i| i.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), N);
    }

    #[test]
    fn concurrent_success_and_failure_deliver_once() {
        let collector = ResultCollector::new();
        let delivered = Arc::new(AtomicUsize::new(0));
        let d1 = Arc::clone(&delivered);
        let d2 = Arc::clone(&delivered);
        let session = collector.begin(
            SessionMode::Multiple,
            move |_| {
                d1.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                d2.fetch_add(1, Ordering::SeqCst);
            },
        );
        session.set_expected_count(16);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let s = Arc::clone(&session);
                thread::spawn(move || {
                    if i % 5 == 0 {
                        s.report_failure(ErrorKind::NoImageDataFound, "boom");
                    } else {
                        s.report_success(item(&i.to_string()));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn concurrent_tasks_resolve_in_completion_order() {
        let collector = ResultCollector::new();
        let (session, rx) = collector.begin_channel(SessionMode::Multiple);
        session.set_expected_count(3);

        let mut gates = Vec::new();
        for name in ["a", "b", "c"] {
            let (tx, gate) = oneshot::channel::<()>();
            gates.push(tx);
            let s = Arc::clone(&session);
            tokio::spawn(async move {
                let _ = gate.await;
                s.report_success(item(name));
            });
        }

        // Release in the order b, c, a and wait for each to land.
        let mut gates: Vec<Option<oneshot::Sender<()>>> = gates.into_iter().map(Some).collect();
        for (done, idx) in [1usize, 2, 0].into_iter().enumerate() {
            if let Some(tx) = gates[idx].take() {
                tx.send(()).unwrap();
            }
            while session.completed_count() < done + 1 && session.is_pending() {
                tokio::task::yield_now().await;
            }
        }

        let items = rx.await.unwrap().unwrap().into_items();
        let paths: Vec<_> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["file:///tmp/b.jpg", "file:///tmp/c.jpg", "file:///tmp/a.jpg"]
        );
    }

    // ── superseding ──────────────────────────────────────────────────

    #[test]
    fn begin_supersedes_silently() {
        let collector = ResultCollector::new();
        let (first, first_outcomes) = recording(&collector, SessionMode::Single);
        let (second, second_outcomes) = recording(&collector, SessionMode::Single);

        assert!(first.is_superseded());
        assert!(first.is_pending());

        first.report_success(item("old"));
        collector.report_success(item("new"));

        assert!(first_outcomes.lock().unwrap().is_empty());
        let second_outcomes = second_outcomes.lock().unwrap();
        assert_eq!(second_outcomes.len(), 1);
        assert_eq!(second_outcomes[0], Ok(Payload::Single(item("new"))));
        assert_eq!(collector.current().map(|s| s.id()), Some(second.id()));
    }

    #[test]
    fn begin_can_reject_previous() {
        let collector = ResultCollector::with_policy(SupersedePolicy::RejectPrevious);
        let (_first, first_outcomes) = recording(&collector, SessionMode::Multiple);
        let (_second, _) = recording(&collector, SessionMode::Single);

        let outcomes = first_outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].clone().unwrap_err().kind, ErrorKind::Superseded);
    }

    #[test]
    fn finished_session_is_not_superseded() {
        let collector = ResultCollector::with_policy(SupersedePolicy::RejectPrevious);
        let (first, first_outcomes) = recording(&collector, SessionMode::Single);
        first.report_success(item("a"));
        let _ = recording(&collector, SessionMode::Single);

        assert!(!first.is_superseded());
        assert_eq!(first_outcomes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn superseded_channel_is_closed() {
        let collector = ResultCollector::new();
        let (_first, rx) = collector.begin_channel(SessionMode::Single);
        let _second = collector.begin_channel(SessionMode::Single);
        assert!(rx.await.is_err());
    }

    // ── collector forwarding ─────────────────────────────────────────

    #[test]
    fn forwarding_without_session_is_noop() {
        let collector = ResultCollector::new();
        collector.report_success(item("a"));
        collector.report_failure(ErrorKind::Cancelled, "x");
        collector.set_expected_count(1);
        assert!(collector.current().is_none());
    }

    #[test]
    fn forwarding_reaches_current_session() {
        let collector = ResultCollector::new();
        let (session, outcomes) = recording(&collector, SessionMode::Multiple);
        collector.set_expected_count(2);
        collector.report_success(item("a"));
        collector.report_success(item("b"));
        assert_eq!(session.terminal_state(), TerminalState::Resolved);
        assert_eq!(outcomes.lock().unwrap().len(), 1);
    }

    #[test]
    fn session_ids_increase() {
        let collector = ResultCollector::new();
        let (a, _) = collector.begin_channel(SessionMode::Single);
        let (b, _) = collector.begin_channel(SessionMode::Single);
        assert!(b.id() > a.id());
    }

    #[test]
    fn standalone_session_with_callbacks() {
        let hit = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hit);
        let session = Session::with_callbacks(
            SessionMode::Single,
            move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
        );
        session.report_success(item("a"));
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }
}
