//! Prompt builder for tutor persona and feedback requests.
//!
//! [`PromptBuilder`] constructs three kinds of prompts:
//! * **System** (`system_prompt`) — persona + curriculum guidance + the tag
//!   grammar the model must use.
//! * **Feedback** (`feedback_prompt`) — asks for tagged feedback on one
//!   learner utterance, optionally with recent conversation turns.
//! * **Summary** (`summary_prompt`) — end-of-session review of the whole
//!   conversation in the same tag grammar.

use crate::conversation::Utterance;
use crate::curriculum::CurriculumContext;

// ---------------------------------------------------------------------------
// Fixed instruction blocks
// ---------------------------------------------------------------------------

const WORKED_EXAMPLE: &str = "\
[CORRECTION]Je suis mange|Je mange|In English: Use \"je mange\" (I eat) not \"je suis mange\" (I am eaten). The verb \"manger\" doesn't need \"suis\" here.[/CORRECTION]
[ENCOURAGEMENT]Great effort with French pronunciation! Keep practicing![/ENCOURAGEMENT]";

const ALTERNATIVE_EXAMPLE: &str = "\
[ALTERNATIVE]Je mange du pain|Je prends du pain|In English: You could also say \"je prends du pain\" (I'm having bread) which is more common at meals.[/ALTERNATIVE]";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds tutor and feedback prompts for one target/native language pair.
///
/// # Example
/// ```rust
/// use lingua_feedback::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new("French", "English");
/// let prompt = builder.feedback_prompt("Je suis mange", None, &[]);
/// assert!(prompt.contains("[CORRECTION]"));
/// ```
pub struct PromptBuilder {
    target_language: String,
    native_language: String,
}

impl PromptBuilder {
    pub fn new(target_language: &str, native_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            native_language: native_language.to_string(),
        }
    }

    /// Persona system prompt with optional curriculum guidance.
    pub fn system_prompt(
        &self,
        persona_prompt: Option<&str>,
        curriculum: Option<&CurriculumContext>,
    ) -> String {
        let target = &self.target_language;
        let native = &self.native_language;

        let mut prompt = String::with_capacity(4096);
        match persona_prompt.filter(|p| !p.trim().is_empty()) {
            Some(persona) => prompt.push_str(persona),
            None => prompt.push_str(&format!(
                "You are a friendly {target} language learning assistant."
            )),
        }

        if let Some(curriculum) = curriculum {
            prompt.push_str("\n\nCURRICULUM GUIDANCE:\n");
            prompt.push_str(&format!("Scenario: {}\n", curriculum.scenario_description));

            prompt.push_str("\nKey Questions to Guide Conversation:\n");
            for (i, objective) in curriculum.objectives.iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. {} (Expected: {})\n",
                    i + 1,
                    objective.question,
                    objective.expected_response
                ));
            }

            prompt.push_str("\nCommon Corrections to Watch For:\n");
            push_correction_examples(&mut prompt, curriculum);

            prompt.push_str(
                "\nUse these curriculum points to naturally guide the conversation and provide targeted learning opportunities.",
            );
        }

        prompt.push_str(&format!(
            "\n\nKey behaviors:
1. Always respond primarily in {target}, but use {native} explanations when needed
2. IMPORTANT: When users make mistakes, provide corrections using this format: [CORRECTION]original|corrected|explanation in {native}[/CORRECTION]
3. If the user's text is already good, provide alternative ways to say the same thing using: [ALTERNATIVE]original|alternative|explanation in {native}[/ALTERNATIVE]
4. Provide encouragement using this format: [ENCOURAGEMENT]encouraging message[/ENCOURAGEMENT]
5. Allow users to mix {target} and {native} - this is normal for learners
6. Ask follow-up questions to keep the conversation going
7. Keep responses conversational and not too long
8. Adapt to the user's level - start simple and gradually increase complexity
9. ALWAYS analyze the user's previous message for either corrections OR alternatives
10. Stay in character and maintain your personality throughout the conversation

Example correction format:
{WORKED_EXAMPLE}

Example alternative format:
{ALTERNATIVE_EXAMPLE}"
        ));

        prompt
    }

    /// Feedback request for one learner utterance.
    ///
    /// `recent_history` (oldest first) is rendered as `role: text` lines when
    /// non-empty.  The instructions always demand feedback, even for a
    /// single word.
    pub fn feedback_prompt(
        &self,
        utterance: &str,
        curriculum: Option<&CurriculumContext>,
        recent_history: &[Utterance],
    ) -> String {
        let target = &self.target_language;
        let native = &self.native_language;

        let mut prompt = String::with_capacity(2048);
        prompt.push_str("IMPORTANT: You MUST provide feedback for every user message, no matter how simple.\n\n");

        if !recent_history.is_empty() {
            prompt.push_str(&format!(
                "Based on this conversation in {target}, provide feedback for the user's most recent message:\n\n"
            ));
            push_transcript(&mut prompt, recent_history);
            prompt.push_str(&format!("\nFOCUS on the user's last message: \"{utterance}\"\n\n"));
        }

        prompt.push_str(&format!("User just said: \"{utterance}\" in {target}."));

        if let Some(curriculum) = curriculum {
            if !curriculum.correction_examples.is_empty() {
                prompt.push_str("\n\nCommon corrections to watch for:\n");
                push_correction_examples(&mut prompt, curriculum);
            }
            if !curriculum.objectives.is_empty() {
                prompt.push_str("\nFocus on these learning objectives:\n");
                for question in curriculum.objective_questions() {
                    prompt.push_str(question);
                    prompt.push('\n');
                }
            }
        }

        prompt.push_str(&format!(
            "\n\nProvide specific, actionable feedback using the following structured format:

1. If there are grammar or vocabulary corrections needed, use:
   [CORRECTION]original phrase|corrected phrase|explanation in {native}[/CORRECTION]

2. If the user's phrase is correct but you want to suggest alternatives, use:
   [ALTERNATIVE]original phrase|alternative phrase|explanation in {native}[/ALTERNATIVE]

3. Always include encouragement using:
   [ENCOURAGEMENT]encouraging message[/ENCOURAGEMENT]

IMPORTANT:
- ALWAYS provide feedback, even for single words like \"hello\" or \"yes\"
- Use the exact format above with pipes (|) to separate parts
- Provide clear explanations in {native}
- Be encouraging and supportive
- You can include multiple corrections/alternatives if needed

Example:
{WORKED_EXAMPLE}"
        ));

        prompt
    }

    /// End-of-session review over the full conversation.
    pub fn summary_prompt(
        &self,
        curriculum: Option<&CurriculumContext>,
        history: &[Utterance],
    ) -> String {
        let mut prompt = String::with_capacity(4096);
        prompt.push_str("Conversation ended. Here's the full conversation:\n");
        push_transcript(&mut prompt, history);
        prompt.push('\n');

        if let Some(curriculum) = curriculum {
            if !curriculum.objectives.is_empty() {
                prompt.push_str("Learning objectives that were focused on:\n");
                for question in curriculum.objective_questions() {
                    prompt.push_str(question);
                    prompt.push('\n');
                }
                prompt.push('\n');
            }
            if !curriculum.correction_examples.is_empty() {
                prompt.push_str("Key corrections to remember:\n");
                for ex in &curriculum.correction_examples {
                    prompt.push_str(&format!("{} → {}\n", ex.incorrect_phrase, ex.correct_phrase));
                }
                prompt.push('\n');
            }
        }

        prompt.push_str(&format!(
            "Provide a comprehensive summary of the learner's {} using structured feedback format:

1. Use [CORRECTION]original|corrected|explanation[/CORRECTION] for any specific errors found in the conversation
2. Use [ALTERNATIVE]phrase|alternative|explanation[/ALTERNATIVE] for suggesting better ways to express ideas
3. Always include [ENCOURAGEMENT]positive message about progress and next steps[/ENCOURAGEMENT]

Cover overall performance, grammar and vocabulary achievements, and what to practice next. Write explanations in {}.",
            self.target_language, self.native_language
        ));

        prompt
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn push_correction_examples(prompt: &mut String, curriculum: &CurriculumContext) {
    for ex in &curriculum.correction_examples {
        prompt.push_str(&format!(
            "- \"{}\" → \"{}\" ({})\n",
            ex.incorrect_phrase, ex.correct_phrase, ex.explanation
        ));
    }
}

fn push_transcript(prompt: &mut String, turns: &[Utterance]) {
    for turn in turns {
        prompt.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.text));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
