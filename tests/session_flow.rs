//! End-to-end session flow with a scripted generator whose replies resolve
//! out of order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lingua_feedback::config::{FeedbackConfig, SessionConfig};
use lingua_feedback::conversation::{
    new_shared_conversation, AnnotationKind, Attachment, RecordKind, ResultStatus,
};
use lingua_feedback::curriculum::CurriculumProvider;
use lingua_feedback::llm::{FeedbackOrchestrator, GenerationError, GenerationRequest, TextGenerator};
use lingua_feedback::pipeline::{ConversationSession, FeedbackEvent};

/// Slow for the first learner turn, fast for the second, so the second
/// result lands before the first.
#[derive(Default)]
struct Scripted {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &request.messages[0].content;

        if prompt.contains("User just said: \"Je suis mange\"") {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok("[CORRECTION]Je suis mange|J'ai mangé|passé composé uses avoir[/CORRECTION]\
                [ENCOURAGEMENT]Bon effort ![/ENCOURAGEMENT]"
                .into())
        } else if prompt.contains("User just said: \"Un café, s'il vous plaît\"") {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok("[ALTERNATIVE]Un café, s'il vous plaît|Je voudrais un café|more polite[/ALTERNATIVE]".into())
        } else {
            Ok("Great session. [ENCOURAGEMENT]Continuez ![/ENCOURAGEMENT]".into())
        }
    }
}

fn build(generator: Arc<dyn TextGenerator>) -> (ConversationSession, mpsc::Receiver<FeedbackEvent>) {
    let feedback = FeedbackConfig {
        feedback_on_assistant_turn: false,
        ..FeedbackConfig::default()
    };
    let (tx, rx) = mpsc::channel(16);
    let session = ConversationSession::new(
        new_shared_conversation(),
        CurriculumProvider::offline(),
        Arc::new(FeedbackOrchestrator::new(generator, &feedback)),
        &SessionConfig::default(),
        &feedback,
    )
    .with_events(tx);
    (session, rx)
}

#[tokio::test(start_paused = true)]
async fn out_of_order_results_land_on_their_own_utterances() {
    let generator = Arc::new(Scripted::default());
    let (session, mut rx) = build(generator.clone());

    let first = session.user_turn("Je suis mange");
    session.assistant_turn("Ah bon ? Et maintenant, vous désirez ?");
    let second = session.user_turn("Un café, s'il vous plaît");
    session.wait_idle().await;

    // Second request resolves first.
    let order: Vec<_> = [rx.recv().await, rx.recv().await]
        .into_iter()
        .flatten()
        .map(|e| match e {
            FeedbackEvent::Attached { target, status, .. } => {
                assert_eq!(status, ResultStatus::Parsed);
                target
            }
            other => panic!("unexpected event: {other:?}"),
        })
        .collect();
    assert_eq!(
        order,
        vec![Attachment::Hinted { id: second }, Attachment::Hinted { id: first }]
    );

    let store = session.snapshot();
    let a = store.get(first).unwrap().annotations.clone().unwrap();
    assert_eq!(a.annotations[0].kind, AnnotationKind::Correction);
    assert_eq!(a.annotations[0].corrected, "J'ai mangé");
    assert_eq!(a.encouragement.as_deref(), Some("Bon effort !"));

    let b = store.get(second).unwrap().annotations.clone().unwrap();
    assert_eq!(b.annotations[0].kind, AnnotationKind::Alternative);
    assert_eq!(b.annotations[0].corrected, "Je voudrais un café");

    assert!(store.records().is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn finish_stores_summary_record() {
    let (session, mut rx) = build(Arc::new(Scripted::default()));

    session.user_turn("Un café, s'il vous plaît");
    let index = session.finish().await;
    assert_eq!(index, Some(0));

    let events: Vec<_> = [rx.recv().await, rx.recv().await].into_iter().flatten().collect();
    assert!(matches!(events[0], FeedbackEvent::Attached { .. }));
    assert_eq!(events[1], FeedbackEvent::SummaryReady { record_index: 0 });

    let store = session.snapshot();
    let record = &store.records()[0];
    assert_eq!(record.kind, RecordKind::SessionSummary);
    assert_eq!(record.result.encouragement.as_deref(), Some("Continuez !"));
    assert_eq!(record.result.clean_text, "Great session.");
}
