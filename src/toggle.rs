//! Optimistic membership toggles (like, bookmark).
//!
//! A toggle flips its local `(active, count)` pair immediately, then writes
//! the membership record and the aggregate counter. If either write fails the
//! exact pre-toggle pair is restored.
//!
//! ```text
//! Idle(a, n) --toggle--> Pending(!a, n±1) --ok--> Idle(!a, n±1)
//!                                         --err-> Idle(a, n)
//! ```
//!
//! The two writes are not atomic with each other: a failure between them
//! leaves the membership record and the counter out of step until the next
//! write. Counter-stage failures are logged separately for that reason.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::app::{NotehubError, Result, WriteStage};
use crate::domain::{ActorId, InteractionKind};
use crate::store::{CounterStore, InsertOutcome, MembershipStore};

/// Observable state of a toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleSnapshot {
    pub active: bool,
    pub count: u64,
    pub pending: bool,
    /// Inline message from the last failed hydration or toggle
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Both remote writes succeeded
    Committed(ToggleSnapshot),
    /// A toggle was already in flight
    Ignored,
    /// The toggle was rebound while the write was in flight
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    Applied { active: bool },
    /// The subject changed before the read resolved
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending,
}

struct ToggleState {
    note_id: String,
    actor: Option<ActorId>,
    active: bool,
    count: u64,
    phase: Phase,
    error: Option<String>,
    /// Bumped whenever the subject or identity changes
    generation: u64,
    /// Subjects with a remote write still outstanding, across rebinds
    in_flight: HashSet<(String, ActorId)>,
}

impl ToggleState {
    fn snapshot(&self) -> ToggleSnapshot {
        ToggleSnapshot {
            active: self.active,
            count: self.count,
            pending: self.phase == Phase::Pending,
            error: self.error.clone(),
        }
    }
}

pub struct OptimisticToggle {
    kind: InteractionKind,
    memberships: Arc<dyn MembershipStore + Send + Sync>,
    counters: Arc<dyn CounterStore + Send + Sync>,
    state: Mutex<ToggleState>,
    observer: watch::Sender<ToggleSnapshot>,
}

impl OptimisticToggle {
    pub fn new(
        kind: InteractionKind,
        memberships: Arc<dyn MembershipStore + Send + Sync>,
        counters: Arc<dyn CounterStore + Send + Sync>,
    ) -> Self {
        let (observer, _) = watch::channel(ToggleSnapshot::default());
        Self {
            kind,
            memberships,
            counters,
            state: Mutex::new(ToggleState {
                note_id: String::new(),
                actor: None,
                active: false,
                count: 0,
                phase: Phase::Idle,
                error: None,
                generation: 0,
                in_flight: HashSet::new(),
            }),
            observer,
        }
    }

    pub fn like(
        memberships: Arc<dyn MembershipStore + Send + Sync>,
        counters: Arc<dyn CounterStore + Send + Sync>,
    ) -> Self {
        Self::new(InteractionKind::Like, memberships, counters)
    }

    pub fn bookmark(
        memberships: Arc<dyn MembershipStore + Send + Sync>,
        counters: Arc<dyn CounterStore + Send + Sync>,
    ) -> Self {
        Self::new(InteractionKind::Bookmark, memberships, counters)
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn snapshot(&self) -> ToggleSnapshot {
        self.lock().snapshot()
    }

    /// Receive every state change, including the optimistic one.
    pub fn subscribe(&self) -> watch::Receiver<ToggleSnapshot> {
        self.observer.subscribe()
    }

    /// Associate the toggle with a note and actor.
    ///
    /// Resets to inactive with the given aggregate count. Any hydration or
    /// write still in flight for the previous subject is not applied.
    /// Rebinding the subject of a pending toggle leaves it untouched.
    pub fn bind(&self, note_id: impl Into<String>, actor: Option<ActorId>, count: u64) {
        let note_id = note_id.into();
        let mut state = self.lock();
        if state.phase == Phase::Pending && state.note_id == note_id && state.actor == actor {
            return;
        }
        state.note_id = note_id;
        state.actor = actor;
        state.active = false;
        state.count = count;
        state.phase = Phase::Idle;
        state.error = None;
        state.generation += 1;
        self.publish(&state);
    }

    /// Swap the signed-in actor, keeping the note and count.
    pub fn set_actor(&self, actor: Option<ActorId>) {
        let mut state = self.lock();
        state.actor = actor;
        state.active = false;
        state.phase = Phase::Idle;
        state.error = None;
        state.generation += 1;
        self.publish(&state);
    }

    /// Read whether the current actor already holds the membership.
    ///
    /// A failed read leaves the toggle inactive with an advisory message and
    /// still usable.
    pub async fn hydrate(&self) -> Result<HydrationOutcome> {
        let (generation, note_id, actor) = {
            let mut state = self.lock();
            state.error = None;
            match state.actor.clone() {
                Some(actor) if !state.note_id.is_empty() => {
                    (state.generation, state.note_id.clone(), actor)
                }
                _ => {
                    state.active = false;
                    self.publish(&state);
                    return Ok(HydrationOutcome::Applied { active: false });
                }
            }
        };

        let result = self.memberships.exists(self.kind, &note_id, &actor).await;

        let mut state = self.lock();
        if state.generation != generation || state.phase == Phase::Pending {
            tracing::debug!(kind = %self.kind, note_id = %note_id, "Discarding stale hydration");
            return Ok(HydrationOutcome::Discarded);
        }

        match result {
            Ok(active) => {
                state.active = active;
                self.publish(&state);
                Ok(HydrationOutcome::Applied { active })
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, note_id = %note_id, error = %e, "Hydration failed");
                let message = self.kind.hydration_message().to_string();
                state.active = false;
                state.error = Some(message.clone());
                self.publish(&state);
                Err(NotehubError::Hydration(message))
            }
        }
    }

    /// Flip membership optimistically and persist it.
    ///
    /// Calls made while a previous toggle is in flight return
    /// [`ToggleOutcome::Ignored`] without writing anything.
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        let (generation, note_id, actor, previous, target) = {
            let mut state = self.lock();
            if state.phase == Phase::Pending {
                return Ok(ToggleOutcome::Ignored);
            }

            let actor = match state.actor.clone() {
                Some(actor) => actor,
                None => {
                    let message = self.kind.sign_in_message().to_string();
                    state.error = Some(message.clone());
                    self.publish(&state);
                    return Err(NotehubError::NotAuthenticated(message));
                }
            };
            if state.note_id.is_empty() {
                let message = "Missing note id.".to_string();
                state.error = Some(message.clone());
                self.publish(&state);
                return Err(NotehubError::Validation(message));
            }
            // A superseded write for this subject has not landed yet.
            let key = (state.note_id.clone(), actor.clone());
            if !state.in_flight.insert(key) {
                return Ok(ToggleOutcome::Ignored);
            }

            let previous = (state.active, state.count);
            let target_active = !state.active;
            let target_count = if target_active {
                state.count.saturating_add(1)
            } else {
                state.count.saturating_sub(1)
            };

            state.active = target_active;
            state.count = target_count;
            state.phase = Phase::Pending;
            state.error = None;
            self.publish(&state);

            (
                state.generation,
                state.note_id.clone(),
                actor,
                previous,
                (target_active, target_count),
            )
        };

        let result = self.persist(&note_id, &actor, target.0, target.1).await;

        let mut state = self.lock();
        state.in_flight.remove(&(note_id.clone(), actor.clone()));
        if state.generation != generation {
            tracing::debug!(kind = %self.kind, note_id = %note_id, "Toggle superseded by rebind");
            return result.map(|_| ToggleOutcome::Superseded);
        }

        state.phase = Phase::Idle;
        match result {
            Ok(()) => {
                self.publish(&state);
                Ok(ToggleOutcome::Committed(state.snapshot()))
            }
            Err(e) => {
                if e.is_partial_write() {
                    tracing::warn!(
                        kind = %self.kind,
                        note_id = %note_id,
                        error = %e,
                        "Membership written but counter update failed; counter may drift"
                    );
                } else {
                    tracing::warn!(kind = %self.kind, note_id = %note_id, error = %e, "Toggle failed");
                }
                state.active = previous.0;
                state.count = previous.1;
                state.error = Some(format!("{} {}", self.kind.failure_message(), e));
                self.publish(&state);
                Err(e)
            }
        }
    }

    async fn persist(&self, note_id: &str, actor: &ActorId, activate: bool, count: u64) -> Result<()> {
        if activate {
            match self.memberships.insert(self.kind, note_id, actor).await {
                Ok(InsertOutcome::Inserted) => {}
                Ok(InsertOutcome::Conflict) => {
                    tracing::debug!(kind = %self.kind, note_id = %note_id, "Membership already present");
                }
                Err(e) => return Err(NotehubError::remote_write(WriteStage::Membership, e)),
            }
        } else {
            self.memberships
                .delete(self.kind, note_id, actor)
                .await
                .map_err(|e| NotehubError::remote_write(WriteStage::Membership, e))?;
        }

        self.counters
            .set_count(note_id, self.kind.counter(), count)
            .await
            .map_err(|e| NotehubError::remote_write(WriteStage::Counter, e))
    }

    fn lock(&self) -> MutexGuard<'_, ToggleState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &ToggleState) {
        self.observer.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::domain::CounterField;
    use crate::store::SqliteStore;

    /// In-memory collaborator with switchable failures and an optional gate
    /// that holds every remote call until released.
    #[derive(Default)]
    struct FakeBackend {
        members: Mutex<Vec<(InteractionKind, String, String)>>,
        counts: Mutex<Vec<(String, CounterField, u64)>>,
        gated: AtomicBool,
        release: Notify,
        fail_exists: AtomicBool,
        fail_insert: AtomicBool,
        fail_delete: AtomicBool,
        fail_counter: AtomicBool,
        inserts: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl FakeBackend {
        fn gated() -> Self {
            let backend = Self::default();
            backend.gated.store(true, Ordering::SeqCst);
            backend
        }

        async fn wait_gate(&self) {
            if self.gated.load(Ordering::SeqCst) {
                self.release.notified().await;
            }
        }

        fn counter_writes(&self) -> Vec<u64> {
            self.counts.lock().unwrap().iter().map(|(_, _, v)| *v).collect()
        }

        fn has_member(&self, kind: InteractionKind, note_id: &str, actor: &str) -> bool {
            self.members
                .lock()
                .unwrap()
                .iter()
                .any(|(k, n, a)| *k == kind && n == note_id && a == actor)
        }
    }

    #[async_trait]
    impl MembershipStore for FakeBackend {
        async fn exists(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<bool> {
            self.wait_gate().await;
            if self.fail_exists.load(Ordering::SeqCst) {
                return Err(NotehubError::Other("read timed out".into()));
            }
            Ok(self.has_member(kind, note_id, actor.as_str()))
        }

        async fn insert(
            &self,
            kind: InteractionKind,
            note_id: &str,
            actor: &ActorId,
        ) -> Result<InsertOutcome> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.wait_gate().await;
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(NotehubError::Other("permission denied".into()));
            }
            if self.has_member(kind, note_id, actor.as_str()) {
                return Ok(InsertOutcome::Conflict);
            }
            self.members
                .lock()
                .unwrap()
                .push((kind, note_id.to_string(), actor.as_str().to_string()));
            Ok(InsertOutcome::Inserted)
        }

        async fn delete(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.wait_gate().await;
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(NotehubError::Other("permission denied".into()));
            }
            self.members
                .lock()
                .unwrap()
                .retain(|(k, n, a)| !(*k == kind && n == note_id && a == actor.as_str()));
            Ok(())
        }
    }

    #[async_trait]
    impl CounterStore for FakeBackend {
        async fn set_count(&self, note_id: &str, field: CounterField, value: u64) -> Result<()> {
            if self.fail_counter.load(Ordering::SeqCst) {
                return Err(NotehubError::Other("counter update rejected".into()));
            }
            self.counts
                .lock()
                .unwrap()
                .push((note_id.to_string(), field, value));
            Ok(())
        }
    }

    fn alice() -> Option<ActorId> {
        ActorId::new("alice")
    }

    fn toggle_for(kind: InteractionKind, backend: &Arc<FakeBackend>) -> OptimisticToggle {
        OptimisticToggle::new(kind, backend.clone(), backend.clone())
    }

    #[test]
    fn test_optimistic_state_visible_before_write_resolves() {
        let backend = Arc::new(FakeBackend::gated());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);
        let observer = toggle.subscribe();

        let mut fut = task::spawn(toggle.toggle());
        assert_pending!(fut.poll());

        let snapshot = toggle.snapshot();
        assert!(snapshot.active);
        assert_eq!(snapshot.count, 6);
        assert!(snapshot.pending);
        assert_eq!(observer.borrow().count, 6);

        backend.release.notify_one();
        assert!(fut.is_woken());
        let outcome = assert_ready!(fut.poll()).unwrap();

        let expected = ToggleSnapshot {
            active: true,
            count: 6,
            pending: false,
            error: None,
        };
        assert_eq!(outcome, ToggleOutcome::Committed(expected.clone()));
        assert_eq!(toggle.snapshot(), expected);
        assert_eq!(backend.counter_writes(), vec![6]);
        assert!(backend.has_member(InteractionKind::Like, "note-1", "alice"));
    }

    #[test]
    fn test_second_toggle_while_pending_is_ignored() {
        let backend = Arc::new(FakeBackend::gated());
        let toggle = toggle_for(InteractionKind::Bookmark, &backend);
        toggle.bind("note-1", alice(), 5);

        let mut first = task::spawn(toggle.toggle());
        assert_pending!(first.poll());

        let mut second = task::spawn(toggle.toggle());
        let outcome = assert_ready!(second.poll()).unwrap();
        assert_eq!(outcome, ToggleOutcome::Ignored);
        assert_eq!(toggle.snapshot().count, 6);

        backend.release.notify_one();
        assert_ready!(first.poll()).unwrap();

        assert_eq!(backend.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(backend.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(backend.counter_writes(), vec![6]);
        assert_eq!(toggle.snapshot().count, 6);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_exactly() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_insert.store(true, Ordering::SeqCst);
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);
        let mut observer = toggle.subscribe();
        observer.mark_unchanged();

        let err = toggle.toggle().await.unwrap_err();
        assert!(matches!(
            err,
            NotehubError::RemoteWrite {
                stage: WriteStage::Membership,
                ..
            }
        ));

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 5);
        assert!(!snapshot.pending);
        assert!(snapshot.error.unwrap().starts_with("Failed to update like."));
        assert!(backend.counter_writes().is_empty());

        // Observer ends on the reverted state
        assert!(observer.has_changed().unwrap());
        assert_eq!(observer.borrow_and_update().count, 5);
    }

    #[tokio::test]
    async fn test_counter_failure_rolls_back_and_is_partial() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_counter.store(true, Ordering::SeqCst);
        let toggle = toggle_for(InteractionKind::Bookmark, &backend);
        toggle.bind("note-1", alice(), 2);

        let err = toggle.toggle().await.unwrap_err();
        assert!(err.is_partial_write());

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 2);
        // The membership write is not compensated
        assert!(backend.has_member(InteractionKind::Bookmark, "note-1", "alice"));
    }

    #[tokio::test]
    async fn test_control_usable_after_failure() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_insert.store(true, Ordering::SeqCst);
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 0);

        assert!(toggle.toggle().await.is_err());

        backend.fail_insert.store(false, Ordering::SeqCst);
        let outcome = toggle.toggle().await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Committed(ref s) if s.active && s.count == 1));
        assert_eq!(toggle.snapshot().error, None);
    }

    #[tokio::test]
    async fn test_deactivate_at_zero_clamps() {
        let backend = Arc::new(FakeBackend::default());
        backend
            .members
            .lock()
            .unwrap()
            .push((InteractionKind::Bookmark, "note-1".into(), "alice".into()));
        let toggle = toggle_for(InteractionKind::Bookmark, &backend);
        toggle.bind("note-1", alice(), 0);

        assert_eq!(
            toggle.hydrate().await.unwrap(),
            HydrationOutcome::Applied { active: true }
        );

        toggle.toggle().await.unwrap();
        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 0);
        assert_eq!(backend.counter_writes(), vec![0]);
        assert!(!backend.has_member(InteractionKind::Bookmark, "note-1", "alice"));
    }

    #[tokio::test]
    async fn test_insert_conflict_counts_as_success() {
        let backend = Arc::new(FakeBackend::default());
        backend
            .members
            .lock()
            .unwrap()
            .push((InteractionKind::Like, "note-1".into(), "alice".into()));
        let toggle = toggle_for(InteractionKind::Like, &backend);
        // Not hydrated, so the toggle believes it is inactive
        toggle.bind("note-1", alice(), 3);

        let outcome = toggle.toggle().await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Committed(ref s) if s.active && s.count == 4));
        assert_eq!(backend.counter_writes(), vec![4]);
    }

    #[tokio::test]
    async fn test_signed_out_fails_fast() {
        let backend = Arc::new(FakeBackend::default());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", None, 5);

        assert_eq!(
            toggle.hydrate().await.unwrap(),
            HydrationOutcome::Applied { active: false }
        );

        let err = toggle.toggle().await.unwrap_err();
        assert!(matches!(err, NotehubError::NotAuthenticated(_)));
        assert_eq!(err.to_string(), "Please sign in to like notes.");

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 5);
        assert_eq!(backend.inserts.load(Ordering::SeqCst), 0);
        assert!(backend.counter_writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_note_id_is_validation_error() {
        let backend = Arc::new(FakeBackend::default());
        let toggle = toggle_for(InteractionKind::Bookmark, &backend);
        toggle.bind("", alice(), 0);

        let err = toggle.toggle().await.unwrap_err();
        assert!(matches!(err, NotehubError::Validation(_)));
        assert_eq!(backend.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hydration_failure_is_advisory() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_exists.store(true, Ordering::SeqCst);
        let toggle = toggle_for(InteractionKind::Bookmark, &backend);
        toggle.bind("note-1", alice(), 1);

        let err = toggle.hydrate().await.unwrap_err();
        assert!(matches!(err, NotehubError::Hydration(_)));

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Failed to check bookmark status.")
        );

        // Still usable
        let outcome = toggle.toggle().await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Committed(ref s) if s.active && s.count == 2));
    }

    #[test]
    fn test_stale_hydration_is_discarded() {
        let backend = Arc::new(FakeBackend::gated());
        backend
            .members
            .lock()
            .unwrap()
            .push((InteractionKind::Like, "note-1".into(), "alice".into()));
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 1);

        let mut hydration = task::spawn(toggle.hydrate());
        assert_pending!(hydration.poll());

        // Subject changes while the read is in flight
        toggle.bind("note-2", alice(), 9);

        backend.release.notify_one();
        let outcome = assert_ready!(hydration.poll()).unwrap();
        assert_eq!(outcome, HydrationOutcome::Discarded);

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 9);
    }

    #[test]
    fn test_identity_change_discards_hydration() {
        let backend = Arc::new(FakeBackend::gated());
        backend
            .members
            .lock()
            .unwrap()
            .push((InteractionKind::Like, "note-1".into(), "alice".into()));
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 1);

        let mut hydration = task::spawn(toggle.hydrate());
        assert_pending!(hydration.poll());

        toggle.set_actor(None);

        backend.release.notify_one();
        assert_eq!(
            assert_ready!(hydration.poll()).unwrap(),
            HydrationOutcome::Discarded
        );
        assert!(!toggle.snapshot().active);
    }

    #[test]
    fn test_rebind_during_toggle_supersedes() {
        let backend = Arc::new(FakeBackend::gated());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);

        let mut fut = task::spawn(toggle.toggle());
        assert_pending!(fut.poll());

        toggle.bind("note-2", alice(), 0);

        backend.release.notify_one();
        assert_eq!(
            assert_ready!(fut.poll()).unwrap(),
            ToggleOutcome::Superseded
        );

        let snapshot = toggle.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.count, 0);
        assert!(!snapshot.pending);
    }

    #[test]
    fn test_rebinding_pending_subject_keeps_guard() {
        let backend = Arc::new(FakeBackend::gated());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);

        let mut first = task::spawn(toggle.toggle());
        assert_pending!(first.poll());

        // Same note and actor, e.g. a list refresh
        toggle.bind("note-1", alice(), 6);
        let snapshot = toggle.snapshot();
        assert!(snapshot.pending);
        assert_eq!(snapshot.count, 6);

        let mut second = task::spawn(toggle.toggle());
        assert_eq!(
            assert_ready!(second.poll()).unwrap(),
            ToggleOutcome::Ignored
        );

        backend.release.notify_one();
        assert!(matches!(
            assert_ready!(first.poll()).unwrap(),
            ToggleOutcome::Committed(ref s) if s.active && s.count == 6
        ));
        assert_eq!(backend.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(backend.counter_writes(), vec![6]);
    }

    #[test]
    fn test_returning_to_note_with_outstanding_write_is_ignored() {
        let backend = Arc::new(FakeBackend::gated());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);

        let mut first = task::spawn(toggle.toggle());
        assert_pending!(first.poll());

        toggle.bind("note-2", alice(), 0);
        toggle.bind("note-1", alice(), 6);

        let mut second = task::spawn(toggle.toggle());
        assert_eq!(
            assert_ready!(second.poll()).unwrap(),
            ToggleOutcome::Ignored
        );
        assert!(!toggle.snapshot().pending);

        backend.release.notify_one();
        assert_eq!(
            assert_ready!(first.poll()).unwrap(),
            ToggleOutcome::Superseded
        );
        assert_eq!(backend.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(backend.counter_writes(), vec![6]);
    }

    #[tokio::test]
    async fn test_toggle_allowed_once_outstanding_write_lands() {
        let backend = Arc::new(FakeBackend::default());
        let toggle = toggle_for(InteractionKind::Like, &backend);
        toggle.bind("note-1", alice(), 5);
        toggle.toggle().await.unwrap();

        toggle.bind("note-1", alice(), 6);
        toggle.hydrate().await.unwrap();
        assert!(matches!(
            toggle.toggle().await.unwrap(),
            ToggleOutcome::Committed(ref s) if !s.active && s.count == 5
        ));
        assert_eq!(backend.counter_writes(), vec![6, 5]);
    }

    #[tokio::test]
    async fn test_independent_instances_on_same_note() {
        let backend = Arc::new(FakeBackend::default());
        let like = toggle_for(InteractionKind::Like, &backend);
        let bookmark = toggle_for(InteractionKind::Bookmark, &backend);
        like.bind("note-1", alice(), 0);
        bookmark.bind("note-1", alice(), 0);

        like.toggle().await.unwrap();
        bookmark.toggle().await.unwrap();

        assert!(like.snapshot().active);
        assert!(bookmark.snapshot().active);
        let counts = backend.counts.lock().unwrap().clone();
        assert_eq!(
            counts,
            vec![
                ("note-1".to_string(), CounterField::Likes, 1),
                ("note-1".to_string(), CounterField::Bookmarks, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_round_trip_against_sqlite() {
        use crate::domain::Note;
        use crate::store::Store;

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut note = Note::new("owner", "pdfs/owner/1-calc.pdf", "Calculus");
        note.likes = 5;
        store.add_note(&note).unwrap();

        let toggle = OptimisticToggle::like(store.clone(), store.clone());
        toggle.bind(note.id.clone(), alice(), note.likes);
        toggle.hydrate().await.unwrap();

        toggle.toggle().await.unwrap();
        assert_eq!(store.get_note(&note.id).unwrap().unwrap().likes, 6);
        assert!(store
            .exists(InteractionKind::Like, &note.id, &alice().unwrap())
            .await
            .unwrap());

        toggle.toggle().await.unwrap();
        assert_eq!(store.get_note(&note.id).unwrap().unwrap().likes, 5);
        assert_eq!(toggle.snapshot().count, 5);
    }
}
