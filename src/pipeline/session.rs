//! Conversation session — wires store, curriculum, orchestrator and router.
//!
//! # Flow
//!
//! ```text
//! user_turn(text)
//!   └─▶ append to store (synchronous, ordered)
//!   └─▶ spawn: curriculum (cached) → request_feedback → attach(hint = id)
//!                                                     └─▶ FeedbackEvent::Attached
//!
//! assistant_turn(text)
//!   └─▶ append to store
//!   └─▶ latest user turn unannotated and not in flight?
//!         └─▶ spawn the same feedback task for it
//!
//! finish()
//!   └─▶ wait for in-flight tasks → request_session_summary
//!         └─▶ free-standing record → FeedbackEvent::SummaryReady
//! ```
//!
//! Feedback tasks run concurrently and may resolve in any order; the router's
//! occupancy check keeps every result on its own utterance.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;

use crate::config::{AppConfig, FeedbackConfig, SessionConfig};
use crate::conversation::{
    attach, lock_store, new_shared_conversation, ConversationStore, RecordKind, Role,
    SharedConversation, Utterance, UtteranceId,
};
use crate::curriculum::{CurriculumContext, CurriculumProvider};
use crate::llm::{ApiGenerator, FeedbackOrchestrator};

use super::events::FeedbackEvent;

// ---------------------------------------------------------------------------
// SessionInner
// ---------------------------------------------------------------------------

struct SessionInner {
    store: SharedConversation,
    provider: CurriculumProvider,
    orchestrator: Arc<FeedbackOrchestrator>,
    curriculum: OnceCell<CurriculumContext>,
    target_language: String,
    scenario: String,
    history_window: usize,
    feedback_on_assistant_turn: bool,
    in_flight: Mutex<HashSet<UtteranceId>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    events: Option<mpsc::Sender<FeedbackEvent>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionInner {
    async fn curriculum(&self) -> &CurriculumContext {
        self.curriculum
            .get_or_init(|| self.provider.get_context(&self.target_language, &self.scenario))
            .await
    }

    fn emit(&self, event: FeedbackEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.try_send(event) {
                log::debug!("session: event not delivered: {e}");
            }
        }
    }

    async fn feedback_for(self: Arc<Self>, id: UtteranceId, text: String, history: Vec<Utterance>) {
        let result = {
            let curriculum = self.curriculum().await;
            self.orchestrator
                .request_feedback(&text, &self.target_language, curriculum, &history)
                .await
        };
        let status = result.status;

        let target = {
            let mut store = lock_store(&self.store);
            let target = attach(result, &mut store, Some(id));
            relock(&self.in_flight).remove(&id);
            target
        };

        log::debug!("session: feedback for {id} landed as {target:?}");
        self.emit(FeedbackEvent::Attached {
            requested_for: id,
            target,
            status,
        });
    }
}

// ---------------------------------------------------------------------------
// ConversationSession
// ---------------------------------------------------------------------------

/// One learner conversation with asynchronous, best-effort feedback.
///
/// Must be used from within a tokio runtime.
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

impl ConversationSession {
    pub fn new(
        store: SharedConversation,
        provider: CurriculumProvider,
        orchestrator: Arc<FeedbackOrchestrator>,
        session: &SessionConfig,
        feedback: &FeedbackConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                provider,
                orchestrator,
                curriculum: OnceCell::new(),
                target_language: session.target_language.clone(),
                scenario: session.scenario.clone(),
                history_window: feedback.history_window,
                feedback_on_assistant_turn: feedback.feedback_on_assistant_turn,
                in_flight: Mutex::new(HashSet::new()),
                tasks: Mutex::new(Vec::new()),
                events: None,
            }),
        }
    }

    /// Session backed by the HTTP curriculum and generation services.
    pub fn from_config(config: &AppConfig) -> Self {
        let orchestrator = FeedbackOrchestrator::new(
            Arc::new(ApiGenerator::from_config(&config.llm)),
            &config.feedback,
        )
        .with_persona(config.session.persona_prompt.clone());

        Self::new(
            new_shared_conversation(),
            CurriculumProvider::from_config(&config.curriculum),
            Arc::new(orchestrator),
            &config.session,
            &config.feedback,
        )
    }

    /// Deliver [`FeedbackEvent`]s on `tx`. Must be called before the first turn.
    pub fn with_events(mut self, tx: mpsc::Sender<FeedbackEvent>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.events = Some(tx),
            None => log::warn!("session: event channel set after tasks were spawned; ignored"),
        }
        self
    }

    /// Fetch (and cache) the curriculum now rather than on the first turn.
    pub async fn prepare(&self) -> CurriculumContext {
        self.inner.curriculum().await.clone()
    }

    /// Record a learner turn and request feedback for it in the background.
    pub fn user_turn(&self, text: impl Into<String>) -> UtteranceId {
        let text = text.into();
        let (id, history) = {
            let mut store = lock_store(&self.inner.store);
            let id = store.append(Role::User, text.clone());
            relock(&self.inner.in_flight).insert(id);
            (id, store.recent(self.inner.history_window).to_vec())
        };
        self.spawn_feedback(id, text, history);
        id
    }

    /// Record an assistant turn.
    ///
    /// With `feedback_on_assistant_turn` set, this also requests feedback for
    /// the latest learner turn when it has none and no request in flight.
    /// Turns added through [`user_turn`](Self::user_turn) always have a
    /// request of their own, so this picks up learner turns appended directly
    /// through [`store`](Self::store), e.g. transcripts restored from elsewhere.
    pub fn assistant_turn(&self, text: impl Into<String>) -> UtteranceId {
        let (id, pending) = {
            let mut store = lock_store(&self.inner.store);
            let id = store.append(Role::Assistant, text);

            // Check and claim under the store lock.
            let pending = if self.inner.feedback_on_assistant_turn {
                store
                    .latest_user()
                    .filter(|u| !u.is_annotated())
                    .filter(|u| {
                        let claimed = relock(&self.inner.in_flight).insert(u.id);
                        if !claimed {
                            log::debug!("session: feedback for {} already in flight", u.id);
                        }
                        claimed
                    })
                    .map(|u| (u.id, u.text.clone()))
            } else {
                None
            };
            let history = store.recent(self.inner.history_window).to_vec();
            (id, pending.map(|(uid, utext)| (uid, utext, history)))
        };

        if let Some((uid, utext, history)) = pending {
            self.spawn_feedback(uid, utext, history);
        }
        id
    }

    /// Wait until every spawned feedback task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(&mut *relock(&self.inner.tasks));
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    log::warn!("session: feedback task failed: {e}");
                }
            }
        }
    }

    /// Finish the session: drain feedback, then store an end-of-session
    /// summary as a free-standing record.
    ///
    /// Returns the record index, or `None` for an empty conversation.
    pub async fn finish(&self) -> Option<usize> {
        self.wait_idle().await;

        let history = lock_store(&self.inner.store).utterances().to_vec();
        if history.is_empty() {
            return None;
        }

        let curriculum = self.inner.curriculum().await;
        let summary = self
            .inner
            .orchestrator
            .request_session_summary(&self.inner.target_language, curriculum, &history)
            .await;

        let index = lock_store(&self.inner.store).push_record(RecordKind::SessionSummary, summary);
        log::info!("session: summary stored as record #{index}");
        self.inner.emit(FeedbackEvent::SummaryReady { record_index: index });
        Some(index)
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> SharedConversation {
        Arc::clone(&self.inner.store)
    }

    /// Point-in-time copy of the conversation.
    pub fn snapshot(&self) -> ConversationStore {
        lock_store(&self.inner.store).clone()
    }

    /// `id` must already be claimed in `in_flight`.
    fn spawn_feedback(&self, id: UtteranceId, text: String, history: Vec<Utterance>) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(inner.feedback_for(id, text, history));

        let mut tasks = relock(&self.inner.tasks);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::conversation::{Attachment, ResultStatus};
    use crate::llm::{GenerationError, GenerationRequest, TextGenerator, DEGRADED_ENCOURAGEMENT};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Echoes the utterance back as a correction and counts calls.
    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = &request.messages[0].content;
            let said = content
                .split("User just said: \"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap_or("summary");
            Ok(format!("[CORRECTION]{said}|{said}!|echo[/CORRECTION]"))
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Request("connection refused".into()))
        }
    }

    fn session(generator: Arc<dyn TextGenerator>, on_assistant: bool) -> ConversationSession {
        let feedback = FeedbackConfig {
            feedback_on_assistant_turn: on_assistant,
            ..FeedbackConfig::default()
        };
        ConversationSession::new(
            new_shared_conversation(),
            CurriculumProvider::offline(),
            Arc::new(FeedbackOrchestrator::new(generator, &feedback)),
            &SessionConfig::default(),
            &feedback,
        )
    }

    fn original_of(store: &ConversationStore, id: UtteranceId) -> Option<String> {
        store
            .get(id)
            .and_then(|u| u.annotations.as_ref())
            .and_then(|r| r.annotations.first())
            .map(|a| a.original.clone())
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn user_turn_gets_its_own_feedback() {
        let s = session(Arc::new(Echo::default()), false);
        let a = s.user_turn("Je suis mange");
        let b = s.user_turn("Il a allé");
        s.wait_idle().await;

        let store = s.snapshot();
        assert_eq!(original_of(&store, a).as_deref(), Some("Je suis mange"));
        assert_eq!(original_of(&store, b).as_deref(), Some("Il a allé"));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn failing_generator_still_marks_every_turn() {
        let s = session(Arc::new(Broken), false);
        let a = s.user_turn("bonjour");
        s.wait_idle().await;

        let store = s.snapshot();
        let ann = store.get(a).unwrap().annotations.clone().unwrap();
        assert_eq!(ann.status, ResultStatus::Degraded);
        assert_eq!(ann.encouragement.as_deref(), Some(DEGRADED_ENCOURAGEMENT));
    }

    #[tokio::test]
    async fn assistant_turn_does_not_duplicate_in_flight_request() {
        let echo = Arc::new(Echo::default());
        let s = session(echo.clone(), true);

        s.user_turn("bonjour");
        s.assistant_turn("Bonjour ! Vous désirez ?");
        s.wait_idle().await;
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);

        s.assistant_turn("Autre chose ?");
        s.wait_idle().await;
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn assistant_turn_requests_feedback_for_directly_appended_user_turn() {
        let echo = Arc::new(Echo::default());
        let s = session(echo.clone(), true);

        let uid = lock_store(&s.store()).append(Role::User, "Je suis mange");
        s.assistant_turn("Ah bon ?");
        s.wait_idle().await;

        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(original_of(&s.snapshot(), uid).as_deref(), Some("Je suis mange"));
    }

    #[tokio::test]
    async fn assistant_turn_feedback_is_off_when_disabled() {
        let echo = Arc::new(Echo::default());
        let s = session(echo.clone(), false);

        let uid = lock_store(&s.store()).append(Role::User, "Je suis mange");
        s.assistant_turn("Ah bon ?");
        s.wait_idle().await;

        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
        assert!(!s.snapshot().get(uid).unwrap().is_annotated());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_assistant_turns_request_once() {
        let echo = Arc::new(Echo::default());
        let s = Arc::new(session(echo.clone(), true));
        let uid = lock_store(&s.store()).append(Role::User, "bonjour");

        let turns: Vec<_> = (0..16)
            .map(|n| {
                let s = Arc::clone(&s);
                tokio::spawn(async move {
                    s.assistant_turn(format!("réponse {n}"));
                })
            })
            .collect();
        for turn in turns {
            turn.await.unwrap();
        }
        s.wait_idle().await;

        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(original_of(&s.snapshot(), uid).as_deref(), Some("bonjour"));
        assert!(s.snapshot().records().is_empty());
    }

    #[tokio::test]
    async fn finished_task_handles_are_pruned() {
        let s = session(Arc::new(Echo::default()), false);
        s.user_turn("un");
        while !relock(&s.inner.tasks).iter().all(|h| h.is_finished()) {
            tokio::task::yield_now().await;
        }

        s.user_turn("deux");
        assert_eq!(relock(&s.inner.tasks).len(), 1);
        s.wait_idle().await;
    }

    #[tokio::test]
    async fn assistant_turn_without_user_turns_requests_nothing() {
        let echo = Arc::new(Echo::default());
        let s = session(echo.clone(), true);
        s.assistant_turn("Bienvenue !");
        s.wait_idle().await;
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn events_report_attachments_and_summary() {
        let (tx, mut rx) = mpsc::channel(8);
        let s = session(Arc::new(Echo::default()), false).with_events(tx);

        let id = s.user_turn("salut");
        s.wait_idle().await;
        match rx.recv().await {
            Some(FeedbackEvent::Attached { requested_for, target, status }) => {
                assert_eq!(requested_for, id);
                assert_eq!(target, Attachment::Hinted { id });
                assert_eq!(status, ResultStatus::Parsed);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let index = s.finish().await;
        assert_eq!(index, Some(0));
        assert_eq!(
            rx.recv().await,
            Some(FeedbackEvent::SummaryReady { record_index: 0 })
        );
        assert_eq!(s.snapshot().records()[0].kind, RecordKind::SessionSummary);
    }

    #[tokio::test]
    async fn finish_on_empty_conversation_is_none() {
        let s = session(Arc::new(Echo::default()), false);
        assert_eq!(s.finish().await, None);
    }

    #[tokio::test]
    async fn prepare_caches_offline_curriculum() {
        let s = session(Arc::new(Echo::default()), false);
        let a = s.prepare().await;
        let b = s.prepare().await;
        assert_eq!(a, b);
        assert!(a.scenario_description.contains("cafe"));
    }
}
