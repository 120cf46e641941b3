//! Application entry point — terminal conversation practice.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (from the path given as the first argument, else the
//!    platform config file; defaults on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the [`ConversationSession`] and prefetch the curriculum.
//! 5. Read turns from stdin until EOF or `/quit`:
//!    lines starting with `>` are tutor turns, anything else is a learner turn.
//! 6. Drain feedback, request the session summary and print the transcript.

use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use lingua_feedback::{
    config::AppConfig,
    conversation::{ConversationStore, Role},
    pipeline::{ConversationSession, FeedbackEvent},
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

enum Turn<'a> {
    Learner(&'a str),
    Tutor(&'a str),
    Quit,
    Skip,
}

fn classify(line: &str) -> Turn<'_> {
    let line = line.trim();
    if line.is_empty() {
        Turn::Skip
    } else if line == "/quit" {
        Turn::Quit
    } else if let Some(rest) = line.strip_prefix('>') {
        Turn::Tutor(rest.trim_start())
    } else {
        Turn::Learner(line)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_transcript(store: &ConversationStore) {
    println!();
    for utterance in store.utterances() {
        let who = match utterance.role {
            Role::User => "you",
            Role::Assistant => "tutor",
        };
        println!("[{}] {who}: {}", utterance.id, utterance.text);

        if let Some(result) = &utterance.annotations {
            for annotation in result.flattened() {
                println!("        {annotation}");
            }
        }
    }

    for record in store.records() {
        println!("\n-- {:?} ({}) --", record.kind, record.created_at.format("%H:%M:%S"));
        for annotation in record.result.flattened() {
            println!("   {annotation}");
        }
        if !record.result.clean_text.is_empty() {
            println!("   {}", record.result.clean_text);
        }
    }
}

async fn log_events(mut rx: mpsc::Receiver<FeedbackEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            FeedbackEvent::Attached { requested_for, target, status } => {
                log::info!("feedback for {requested_for}: {status:?} → {target:?}");
            }
            FeedbackEvent::SummaryReady { record_index } => {
                log::info!("session summary ready (record #{record_index})");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<FeedbackEvent>(64);
    let events = tokio::spawn(log_events(event_rx));

    let session = ConversationSession::from_config(&config).with_events(event_tx);
    let curriculum = session.prepare().await;
    println!(
        "Practising {} ({}). {}",
        config.session.target_language, config.session.scenario, curriculum.scenario_description
    );
    for question in curriculum.objective_questions() {
        println!("  - {question}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match classify(&line) {
            Turn::Learner(text) => {
                session.user_turn(text);
            }
            Turn::Tutor(text) => {
                session.assistant_turn(text);
            }
            Turn::Quit => break,
            Turn::Skip => {}
        }
    }

    session.finish().await;
    print_transcript(&session.snapshot());

    drop(session);
    if let Err(e) = events.await {
        log::warn!("event logger stopped abnormally: {e}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("lingua-feedback starting up");

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load_from(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_splits_tutor_and_learner_lines() {
        assert!(matches!(classify("> Bonjour !"), Turn::Tutor("Bonjour !")));
        assert!(matches!(classify("Je suis mange"), Turn::Learner("Je suis mange")));
        assert!(matches!(classify("   "), Turn::Skip));
        assert!(matches!(classify("/quit"), Turn::Quit));
    }
}
