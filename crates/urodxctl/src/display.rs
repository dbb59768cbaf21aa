//! Text rendering for terminal output.
//!
//! Plain ASCII; colour is optional so the same text can be tested and piped.

use crate::session::{SessionOutcome, StopReason};
use owo_colors::OwoColorize;
use std::fmt::Write;
use urodx_engine::{ActionPlan, Confidence, QuestionPlan, Recommendation, ScoreResult, Urgency};

pub const SEPARATOR: &str = "------------------------------------------------------------";

/// Number of ranked conditions shown in the probability table
const SHOWN_CONDITIONS: usize = 5;

fn urgency_tag(urgency: Urgency, color: bool) -> String {
    let tag = format!("[{}]", urgency.as_str().to_uppercase());
    if !color {
        return tag;
    }
    match urgency {
        Urgency::Urgent => tag.bright_red().to_string(),
        Urgency::Soon => tag.yellow().to_string(),
        Urgency::Routine => tag.bright_green().to_string(),
    }
}

fn confidence_text(confidence: Confidence, color: bool) -> String {
    let text = confidence.as_str().to_string();
    if !color {
        return text;
    }
    match confidence {
        Confidence::High | Confidence::ModerateHigh => text.bright_green().to_string(),
        Confidence::Moderate => text.yellow().to_string(),
        Confidence::Low => text.bright_red().to_string(),
    }
}

fn bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
}

pub fn render_recommendation(rec: &Recommendation, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[DIAGNOSIS] {}", rec.primary_diagnosis);
    let _ = writeln!(
        out,
        "  probability {:.1}%, confidence {}",
        rec.probability * 100.0,
        confidence_text(rec.confidence, color)
    );
    if !rec.self_care.is_empty() {
        let _ = writeln!(out, "[SELF-CARE]");
        for item in &rec.self_care {
            let _ = writeln!(out, "  * {}", item);
        }
    }
    if !rec.procedures.is_empty() {
        let _ = writeln!(out, "[PROCEDURES]");
        for item in &rec.procedures {
            let _ = writeln!(out, "  * {}", item);
        }
    }
    if let Some(note) = &rec.note {
        let _ = writeln!(out, "[NOTE] {}", note);
    }
    out
}

pub fn render_action_plan(plan: &ActionPlan, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", urgency_tag(plan.urgency, color), plan.action);
    if !plan.next_steps.is_empty() {
        let _ = writeln!(out, "[NEXT STEPS]");
        for (i, step) in plan.next_steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, step);
        }
    }
    let red_flags = format!("Seek care now if: {}", plan.red_flags);
    if color {
        let _ = writeln!(out, "[WARNING] {}", red_flags.bright_red());
    } else {
        let _ = writeln!(out, "[WARNING] {}", red_flags);
    }
    out
}

pub fn render_probabilities(result: &ScoreResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[DIFFERENTIAL]");
    for ranked in result.ranked.iter().take(SHOWN_CONDITIONS) {
        let _ = writeln!(
            out,
            "  {:<28} {} {:>5.1}%",
            ranked.label,
            bar(ranked.probability),
            ranked.probability * 100.0
        );
    }
    let _ = writeln!(
        out,
        "  entropy {:.3} of {:.3}",
        result.entropy.distribution, result.entropy.max
    );
    out
}

pub fn render_score(result: &ScoreResult, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&render_probabilities(result));
    out.push('\n');
    out.push_str(&render_recommendation(&result.recommendation, color));
    out.push('\n');
    out.push_str(&render_action_plan(&result.action_plan, color));
    if !result.citations.is_empty() {
        let _ = writeln!(out, "\n[SOURCES]");
        for citation in &result.citations {
            let _ = writeln!(out, "  * {}", citation);
        }
    }
    out
}

pub fn render_plan(plan: &QuestionPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[QUESTIONS] entropy {:.3}", plan.current_entropy);
    if plan.suggestions.is_empty() {
        let _ = writeln!(out, "  no informative question left");
    }
    for suggestion in &plan.suggestions {
        let _ = writeln!(
            out,
            "  {:<16} gain {:.3}  {}",
            suggestion.symptom_id, suggestion.information_gain, suggestion.question
        );
        if let Some(rationale) = &suggestion.rationale {
            let _ = writeln!(out, "  {:<16} {}", "", rationale);
        }
    }
    out
}

pub fn render_outcome(outcome: &SessionOutcome, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", SEPARATOR);
    let _ = writeln!(
        out,
        "Stopped after {} question(s): {}",
        outcome.asked.len(),
        outcome.stop.describe()
    );
    if outcome.stop == StopReason::UserQuit && outcome.asked.is_empty() {
        let _ = writeln!(out, "No answers recorded; result reflects demographics only.");
    }
    let _ = writeln!(out, "{}", SEPARATOR);
    out.push_str(&render_score(&outcome.result, color));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use urodx_engine::{DifferentialEngine, EngineConfig, Gender, Onset, PatientContext, SymptomEvidence};

    fn engine() -> DifferentialEngine {
        DifferentialEngine::urology(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar(0.0), ".".repeat(20));
        assert_eq!(bar(1.0), "#".repeat(20));
        assert_eq!(bar(0.5).matches('#').count(), 10);
    }

    #[test]
    fn test_score_text_has_no_escape_codes() {
        let engine = engine();
        let patient = PatientContext::new(72, Gender::Male);
        let evidence = SymptomEvidence::new().with_onset(Onset::Gradual);
        let text = render_score(&engine.score(&evidence, &patient), false);

        assert!(text.contains("[DIFFERENTIAL]"));
        assert!(text.contains("[NEXT STEPS]"));
        assert!(text.contains("PSA"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_plan_lists_opening_questions() {
        let engine = engine();
        let plan = engine.plan_questions(&SymptomEvidence::new(), &PatientContext::default());
        let text = render_plan(&plan);
        assert!(text.contains("onset_speed"));
        assert!(text.contains("pain_burning"));
    }
}
