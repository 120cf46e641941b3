//! Curriculum context types and the deterministic offline fallback.
//!
//! Field names serialise to the curriculum service's wire format
//! (`scenario_scene`, `curriculum_questions`, `correction_examples`).

use serde::{Deserialize, Serialize};

/// One guiding question and the kind of answer expected from the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub question: String,
    pub expected_response: String,
}

/// A typical learner mistake with its correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionExample {
    pub incorrect_phrase: String,
    pub correct_phrase: String,
    pub explanation: String,
}

/// Scenario-specific learning context used to steer feedback generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumContext {
    #[serde(rename = "scenario_scene")]
    pub scenario_description: String,
    #[serde(rename = "curriculum_questions")]
    pub objectives: Vec<Objective>,
    pub correction_examples: Vec<CorrectionExample>,
}

impl CurriculumContext {
    /// A payload is usable when it at least describes the scenario.
    pub fn is_well_formed(&self) -> bool {
        !self.scenario_description.trim().is_empty()
    }

    /// Objective questions only, in order.
    pub fn objective_questions(&self) -> Vec<&str> {
        self.objectives.iter().map(|o| o.question.as_str()).collect()
    }
}

/// Build the offline curriculum for `(target_language, scenario)`.
///
/// Pure: the same inputs always produce an identical context.
pub fn fallback_context(target_language: &str, scenario: &str) -> CurriculumContext {
    let scene = scenario.to_lowercase();

    CurriculumContext {
        scenario_description: format!(
            "You are in a {scene} scenario, practicing {target_language}. This is a great \
             opportunity to improve your language skills through real-world conversation."
        ),
        objectives: vec![
            Objective {
                question: format!("How would you start a conversation in this {scene} situation?"),
                expected_response: format!(
                    "Begin with a polite greeting appropriate for {target_language} culture."
                ),
            },
            Objective {
                question: "What key vocabulary should you focus on for this scenario?".into(),
                expected_response: format!(
                    "Practice common phrases and words related to {scene}."
                ),
            },
            Objective {
                question: "How would you ask for help or clarification if you don't understand?"
                    .into(),
                expected_response: "Use polite phrases to request repetition or explanation."
                    .into(),
            },
        ],
        correction_examples: vec![CorrectionExample {
            incorrect_phrase: "Hello, I want...".into(),
            correct_phrase: "Hello, I would like...".into(),
            explanation: "Use more polite forms when making requests in formal situations.".into(),
        }],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        let a = fallback_context("French", "Restaurant");
        let b = fallback_context("French", "Restaurant");
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn fallback_shape() {
        let ctx = fallback_context("Japanese", "Train Station");
        assert!(ctx.is_well_formed());
        assert_eq!(ctx.objectives.len(), 3);
        assert_eq!(ctx.correction_examples.len(), 1);
        assert!(ctx.scenario_description.contains("train station"));
        assert!(ctx.scenario_description.contains("Japanese"));
        assert!(ctx.objectives[0].question.contains("train station"));
    }

    #[test]
    fn fallback_depends_on_inputs() {
        assert_ne!(
            fallback_context("French", "Cafe"),
            fallback_context("Spanish", "Cafe")
        );
    }

    #[test]
    fn deserializes_wire_format() {
        let json = r#"{
            "scenario_scene": "Ordering coffee in Lyon",
            "curriculum_questions": [
                {"question": "What would you like?", "expected_response": "Un café, s'il vous plaît."}
            ],
            "correction_examples": [
                {"incorrect_phrase": "Je veux", "correct_phrase": "Je voudrais", "explanation": "politer"}
            ]
        }"#;
        let ctx: CurriculumContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.scenario_description, "Ordering coffee in Lyon");
        assert_eq!(ctx.objective_questions(), vec!["What would you like?"]);
        assert_eq!(ctx.correction_examples[0].correct_phrase, "Je voudrais");
    }

    #[test]
    fn missing_field_is_rejected() {
        let json = r#"{"scenario_scene": "x", "curriculum_questions": []}"#;
        assert!(serde_json::from_str::<CurriculumContext>(json).is_err());
    }

    #[test]
    fn blank_scenario_is_not_well_formed() {
        let mut ctx = fallback_context("French", "Cafe");
        ctx.scenario_description = "   ".into();
        assert!(!ctx.is_well_formed());
    }
}
