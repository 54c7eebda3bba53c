//! Canned bot copy and fixed option prompts.

use crate::error::OperationKind;
use crate::transcript::Choice;

use super::catalog::SymptomCategory;

// ── Welcome ─────────────────────────────────────────────────────────

pub const GREETING: &str = "Hello! I'm your Health Symptom Assistant. 🩺";

pub const DISCLAIMER: &str = "⚠️ IMPORTANT DISCLAIMER: I am NOT a doctor and cannot \
    provide medical diagnoses. This tool is for informational purposes only and should \
    not replace professional medical advice.";

pub const EMERGENCY_NOTICE: &str = "🚨 EMERGENCY: If you're experiencing a medical \
    emergency, call 911 immediately or go to your nearest emergency room.";

pub const CONSENT_QUESTION: &str = "By continuing, you understand this is for general \
    guidance only. Do you wish to continue?";

/// The continue/emergency prompt shown after the welcome script.
pub fn consent_prompt() -> Vec<Choice> {
    vec![
        Choice::new("continue", "✅ Yes, I understand and want to continue"),
        Choice::emergency("emergency", "🚨 I need emergency help now"),
    ]
}

// ── Emergency path ──────────────────────────────────────────────────

pub const EMERGENCY_ALERT: &str = "🚨 CALL 911 IMMEDIATELY 🚨";

/// The fixed guidance list shown right after the emergency alert.
pub const EMERGENCY_GUIDANCE: &str = "This appears to be a medical emergency. Please:\n\
    • Call 911 or your local emergency number\n\
    • Go to the nearest emergency room\n\
    • If possible, have someone drive you\n\
    • Don't drive yourself if symptoms are severe";

// ── Symptom selection ───────────────────────────────────────────────

pub const SELECTION_INTRO: &str =
    "I'll help you assess your symptoms. Let's start with a simple question:";

pub const SELECTION_QUESTION: &str = "What symptoms are you experiencing today? You can \
    describe them in your own words, and I'll guide you through the assessment.";

/// The describe-or-categories choice.
pub fn selection_prompt() -> Vec<Choice> {
    vec![
        Choice::new("describe", "💬 I want to describe my symptoms"),
        Choice::new("categories", "📋 Show me symptom categories"),
    ]
}

/// The full category list plus the escape hatch for anything unlisted.
pub fn category_prompt(categories: &[SymptomCategory]) -> Vec<Choice> {
    let mut choices: Vec<Choice> = categories
        .iter()
        .map(|c| Choice::new(c.key.clone(), c.name.clone()))
        .collect();
    choices.push(Choice::new("other", "Something else/Not sure"));
    choices
}

// ── Free-text description ───────────────────────────────────────────

pub const DESCRIBE_COACHING: [&str; 6] = [
    "Perfect! Please describe your symptoms in detail. For example:",
    "• What kind of pain or discomfort are you feeling?",
    "• Where is it located?",
    "• When did it start?",
    "• How severe is it?",
    "• Are there any other symptoms?",
];

pub fn back_prompt() -> Vec<Choice> {
    vec![Choice::new("back", "⬅️ Go back to options")]
}

pub const INTERPRETED_INTRO: &str =
    "Thank you for describing your symptoms. I understand you're experiencing:";

pub const INTERPRETED_NEXT: &str =
    "Let me guide you through some specific questions to better assess your situation.";

/// Transition line naming the reasoning behind the suggested category.
pub fn interpreted_reasoning(reasoning: Option<&str>) -> String {
    format!(
        "Based on your description, I believe this relates to {}.",
        reasoning.unwrap_or("your symptoms")
    )
}

pub const UNRESOLVED_INTRO: &str = "I understand you're experiencing symptoms, but I \
    need a bit more information to help you effectively.";

pub const UNRESOLVED_QUESTION: &str = "Which of these areas best matches your main concern?";

// ── Professional referral ───────────────────────────────────────────

pub const REFERRAL: &str = "For symptoms not listed, I recommend consulting with a \
    healthcare professional directly.";

pub const REFERRAL_NEXT: &str =
    "They can provide proper evaluation and guidance for your specific situation.";

// ── Assessment completion ───────────────────────────────────────────

pub const ASSESSMENT_INTRO: &str = "Based on your responses, here's my assessment:";

pub const INSIGHTS_HEADER: &str = "🤖 AI-Enhanced Insights:";

pub const URGENCY_HIGH: &str = "⚠️ Urgency Level: HIGH - Seek medical attention promptly";

pub const URGENCY_MEDIUM: &str = "⚠️ Urgency Level: MEDIUM - Consider medical consultation";

pub const CLOSING_DISCLAIMER: &str = "Remember: This is general guidance only. Always \
    consult with a healthcare professional for proper medical advice.";

pub fn restart_prompt() -> Vec<Choice> {
    vec![
        Choice::new("restart", "🔄 Check another symptom"),
        Choice::new("complete", "✅ I'm done"),
    ]
}

pub const GOODBYE: &str = "Thank you for using the Health Symptom Checker. Stay healthy! 🌟";

pub const GOODBYE_REMINDER: &str =
    "Remember: When in doubt, consult with a healthcare professional.";

// ── Failure notices ─────────────────────────────────────────────────

/// Chat-bubble warning for a failed remote operation.
pub fn failure_notice(operation: OperationKind) -> &'static str {
    match operation {
        OperationKind::Session => {
            "⚠️ Unable to start a session. Please make sure the triage backend is \
             running and refresh to try again."
        }
        OperationKind::Catalog => {
            "⚠️ Unable to load symptom categories. Please make sure the triage backend \
             is running and try again."
        }
        OperationKind::Questions => "⚠️ Unable to load questions. Please try again.",
        OperationKind::Submission => {
            "⚠️ I couldn't save that answer remotely, but your assessment will continue."
        }
        OperationKind::Interpretation => {
            "I had trouble processing your description. Let me show you the symptom \
             categories instead."
        }
        OperationKind::Completion => {
            "⚠️ Unable to generate recommendations. Please consult with a healthcare \
             professional."
        }
    }
}
