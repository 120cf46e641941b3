//! Tag grammar extraction.
//!
//! Recognised blocks (case-sensitive, any order, repeatable):
//!
//! ```text
//! [CORRECTION]original|corrected|explanation[/CORRECTION]
//! [ALTERNATIVE]original|alternative|explanation[/ALTERNATIVE]
//! [ENCOURAGEMENT]message[/ENCOURAGEMENT]
//! ```
//!
//! Anything that does not form a complete block is inert text and stays in
//! `clean_text` untouched.

use std::sync::OnceLock;

use regex::Regex;

use crate::conversation::{Annotation, AnnotationResult, ResultStatus};

/// Matches a single opening or closing marker. Blocks are assembled from
/// the marker sequence in one pass.
fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[(?P<close>/?)(?P<tag>CORRECTION|ALTERNATIVE|ENCOURAGEMENT)\]")
            .expect("marker pattern is a valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Correction,
    Alternative,
    Encouragement,
}

impl Block {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "CORRECTION" => Some(Block::Correction),
            "ALTERNATIVE" => Some(Block::Alternative),
            "ENCOURAGEMENT" => Some(Block::Encouragement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    kind: Block,
    closing: bool,
    start: usize,
    end: usize,
}

fn markers(text: &str) -> Vec<Marker> {
    marker_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Marker {
                kind: Block::from_tag(caps.name("tag")?.as_str())?,
                closing: caps.name("close").is_some_and(|c| !c.as_str().is_empty()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Split `original|corrected|explanation` on the first two separators.
fn split_fields(body: &str) -> Option<(&str, &str, &str)> {
    let mut parts = body.splitn(3, '|');
    Some((parts.next()?, parts.next()?, parts.next()?))
}

/// Parse `text` into a clean body and its annotations.
///
/// Never fails: malformed blocks are left in place as plain text. Runs in
/// time linear in the length of `text`.
///
/// ```
/// use lingua_feedback::markup::extract;
///
/// let r = extract("Bien ! [CORRECTION]Je suis mange|Je mange|auxiliary[/CORRECTION]");
/// assert_eq!(r.annotations.len(), 1);
/// assert_eq!(r.clean_text, "Bien !");
/// ```
pub fn extract(text: &str) -> AnnotationResult {
    let markers = markers(text);

    let mut annotations = Vec::new();
    let mut encouragement: Option<String> = None;
    let mut encouragement_seen = false;
    let mut clean = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut i = 0;

    while i < markers.len() {
        let open = markers[i];
        i += 1;
        if open.closing {
            continue;
        }

        // The block closes at the first closer of its own kind, provided no
        // other opener comes first. Closers of other kinds are inert text.
        let Some(offset) = markers[i..]
            .iter()
            .take_while(|m| m.closing)
            .position(|m| m.kind == open.kind)
        else {
            continue;
        };
        let close = markers[i + offset];
        let body = &text[open.end..close.start];

        let accepted = match open.kind {
            Block::Encouragement => {
                if !encouragement_seen {
                    encouragement_seen = true;
                    let msg = body.trim();
                    if !msg.is_empty() {
                        encouragement = Some(msg.to_string());
                    }
                }
                true
            }
            kind => match split_fields(body) {
                Some((original, corrected, explanation)) => {
                    annotations.push(if kind == Block::Correction {
                        Annotation::correction(original, corrected, explanation)
                    } else {
                        Annotation::alternative(original, corrected, explanation)
                    });
                    true
                }
                None => false,
            },
        };

        if accepted {
            clean.push_str(&text[copied_to..open.start]);
            copied_to = close.end;
            i += offset + 1;
        } else {
            log::debug!("markup: skipping {:?} block with too few fields", open.kind);
        }
    }
    clean.push_str(&text[copied_to..]);

    AnnotationResult {
        annotations,
        encouragement,
        clean_text: clean.trim().to_string(),
        status: ResultStatus::Parsed,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
