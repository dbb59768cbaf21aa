//! Interactive questioning session.
//!
//! Owns the turn loop the engine leaves to its caller: score, pick the best
//! question, ask, record the answer, rescore. Stops when the posterior is
//! confident enough, the question budget runs out, no question has positive
//! gain, the user quits, or input ends.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, info};
use urodx_engine::catalog::InitialTarget;
use urodx_engine::evidence::Answer;
use urodx_engine::{
    AnswerType, DifferentialEngine, Onset, PatientContext, QuestionSuggestion, ScoreResult,
    SymptomEvidence,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Confident,
    QuestionLimit,
    NoInformativeQuestion,
    UserQuit,
    EndOfInput,
}

impl StopReason {
    pub fn describe(&self) -> &'static str {
        match self {
            StopReason::Confident => "posterior is confident enough",
            StopReason::QuestionLimit => "question limit reached",
            StopReason::NoInformativeQuestion => "no remaining question is informative",
            StopReason::UserQuit => "stopped by user",
            StopReason::EndOfInput => "input ended",
        }
    }
}

/// Parse free text against the expected answer type
pub fn parse_answer(answer_type: AnswerType, input: &str) -> Result<Answer> {
    let text = input.trim().to_lowercase();
    let yes_no = match text.as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    };

    match answer_type {
        AnswerType::YesNo => match yes_no {
            Some(v) => Ok(Answer::YesNo(v)),
            None => bail!("Please answer yes or no"),
        },
        AnswerType::Scale0To10 => {
            if let Some(v) = yes_no {
                return Ok(Answer::YesNo(v));
            }
            let value: u8 = text.parse().context("Please answer with a number from 0 to 10")?;
            if value > 10 {
                bail!("Please answer with a number from 0 to 10");
            }
            Ok(Answer::Scale(value))
        }
        AnswerType::Count => {
            if let Some(v) = yes_no {
                return Ok(Answer::YesNo(v));
            }
            let value: u32 = text.parse().context("Please answer with a whole number")?;
            Ok(Answer::Count(value))
        }
        AnswerType::Categorical => match Onset::parse(&text) {
            Some(onset) => Ok(Answer::Onset(onset)),
            None => bail!("Please answer sudden or gradual"),
        },
    }
}

fn answer_hint(answer_type: AnswerType) -> &'static str {
    match answer_type {
        AnswerType::YesNo => "[yes/no]",
        AnswerType::Scale0To10 => "[0-10]",
        AnswerType::Count => "[number]",
        AnswerType::Categorical => "[sudden/gradual]",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskedQuestion {
    pub symptom_id: String,
    pub answer: Answer,
    pub information_gain: f64,
}

#[derive(Debug)]
enum Reply {
    Answer(Answer),
    Quit,
    EndOfInput,
}

/// Prompt until the input parses or ends
fn ask<R: BufRead, W: Write>(suggestion: &QuestionSuggestion, input: &mut R, output: &mut W) -> Result<Reply> {
    loop {
        write!(output, "{} {} ", suggestion.question, answer_hint(suggestion.answer_type))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(Reply::EndOfInput);
        }
        let trimmed = line.trim();
        if matches!(trimmed, "q" | "quit") {
            return Ok(Reply::Quit);
        }
        match parse_answer(suggestion.answer_type, trimmed) {
            Ok(answer) => return Ok(Reply::Answer(answer)),
            Err(e) => {
                debug!(symptom = %suggestion.symptom_id, input = trimmed, "unparsed answer");
                writeln!(output, "  {}", e)?;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub stop: StopReason,
    pub asked: Vec<AskedQuestion>,
    pub patient: PatientContext,
    pub evidence: SymptomEvidence,
    pub result: ScoreResult,
}

pub struct Session<'a> {
    engine: &'a DifferentialEngine,
    pub patient: PatientContext,
    pub evidence: SymptomEvidence,
    pub asked: Vec<AskedQuestion>,
}

impl<'a> Session<'a> {
    pub fn new(engine: &'a DifferentialEngine, patient: PatientContext, evidence: SymptomEvidence) -> Self {
        Self {
            engine,
            patient,
            evidence,
            asked: Vec::new(),
        }
    }

    /// Apply one answer to the evidence
    pub fn record(&mut self, suggestion: &QuestionSuggestion, answer: Answer) -> Result<()> {
        let is_onset = self
            .engine
            .catalog()
            .initial_questions
            .iter()
            .any(|q| q.target == InitialTarget::OnsetSpeed && q.id() == suggestion.symptom_id);

        if is_onset {
            match answer {
                Answer::Onset(onset) => self.evidence.onset_speed = Some(onset),
                _ => bail!("Onset needs sudden or gradual"),
            }
        } else {
            let def = self
                .engine
                .catalog()
                .symptom(&suggestion.symptom_id)
                .with_context(|| format!("Unknown symptom '{}'", suggestion.symptom_id))?;
            self.evidence
                .apply_answer(def.probe, &def.id, answer, &mut self.patient)?;
        }

        self.asked.push(AskedQuestion {
            symptom_id: suggestion.symptom_id.clone(),
            answer,
            information_gain: suggestion.information_gain,
        });
        Ok(())
    }

    /// Why the loop should stop now, if it should
    pub fn stop_reason(&self) -> Option<StopReason> {
        let settings = &self.engine.config().questioning;
        let posterior = self.engine.posterior(&self.evidence, &self.patient);
        let entropy = urodx_engine::distribution_entropy(posterior.probabilities());
        if entropy <= settings.effective_stop_entropy() {
            return Some(StopReason::Confident);
        }
        if self.asked.len() >= settings.effective_max_questions() {
            return Some(StopReason::QuestionLimit);
        }
        None
    }

    /// Run the loop until a stop condition, reading answers line by line
    pub fn run<R: BufRead, W: Write>(mut self, mut input: R, mut output: W) -> Result<SessionOutcome> {
        let stop = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            let Some(suggestion) = self.engine.next_question(&self.evidence, &self.patient) else {
                break StopReason::NoInformativeQuestion;
            };

            match ask(&suggestion, &mut input, &mut output)? {
                Reply::Answer(answer) => {
                    self.record(&suggestion, answer)?;
                    info!(
                        symptom = %suggestion.symptom_id,
                        gain = suggestion.information_gain,
                        asked = self.asked.len(),
                        "answer recorded"
                    );
                }
                Reply::Quit => break StopReason::UserQuit,
                Reply::EndOfInput => break StopReason::EndOfInput,
            }
        };

        info!(reason = ?stop, questions = self.asked.len(), "session finished");
        let result = self.engine.score(&self.evidence, &self.patient);
        Ok(SessionOutcome {
            stop,
            asked: self.asked,
            patient: self.patient,
            evidence: self.evidence,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use urodx_engine::{EngineConfig, Gender, SeverityField};

    fn engine() -> DifferentialEngine {
        DifferentialEngine::urology(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_answer(AnswerType::YesNo, " Yes ").unwrap(), Answer::YesNo(true));
        assert_eq!(parse_answer(AnswerType::YesNo, "n").unwrap(), Answer::YesNo(false));
        assert!(parse_answer(AnswerType::YesNo, "maybe").is_err());
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!(parse_answer(AnswerType::Scale0To10, "7").unwrap(), Answer::Scale(7));
        assert_eq!(parse_answer(AnswerType::Scale0To10, "no").unwrap(), Answer::YesNo(false));
        assert!(parse_answer(AnswerType::Scale0To10, "11").is_err());
        assert!(parse_answer(AnswerType::Scale0To10, "-1").is_err());
    }

    #[test]
    fn test_parse_count_and_onset() {
        assert_eq!(parse_answer(AnswerType::Count, "4").unwrap(), Answer::Count(4));
        assert_eq!(
            parse_answer(AnswerType::Categorical, "gradual").unwrap(),
            Answer::Onset(Onset::Gradual)
        );
        assert!(parse_answer(AnswerType::Categorical, "often").is_err());
    }

    #[test]
    fn test_record_onset_and_severity() {
        let engine = engine();
        let mut session = Session::new(&engine, PatientContext::new(70, Gender::Male), SymptomEvidence::new());
        let plan = engine.plan_questions(&session.evidence, &session.patient);
        let onset = plan.best().unwrap().clone();
        assert_eq!(onset.symptom_id, "onset_speed");
        session.record(&onset, Answer::Onset(Onset::Gradual)).unwrap();
        assert_eq!(session.evidence.onset_speed, Some(Onset::Gradual));

        let weak = QuestionSuggestion {
            symptom_id: "weak_stream".into(),
            question: String::new(),
            information_gain: 0.3,
            answer_type: AnswerType::Scale0To10,
            rationale: None,
        };
        session.record(&weak, Answer::Scale(8)).unwrap();
        assert_eq!(session.evidence.severity(SeverityField::WeakStream), Some(80));
        assert_eq!(session.asked.len(), 2);
    }

    #[test]
    fn test_record_rejects_wrong_answer_kind() {
        let engine = engine();
        let mut session = Session::new(&engine, PatientContext::default(), SymptomEvidence::new());
        let fever = QuestionSuggestion {
            symptom_id: "fever".into(),
            question: String::new(),
            information_gain: 0.5,
            answer_type: AnswerType::YesNo,
            rationale: None,
        };
        assert!(session.record(&fever, Answer::Onset(Onset::Sudden)).is_err());
        assert!(session.asked.is_empty());
    }

    #[test]
    fn test_run_until_input_ends() {
        let engine = engine();
        let session = Session::new(&engine, PatientContext::new(72, Gender::Male), SymptomEvidence::new());
        let input = Cursor::new("gradual\n");
        let mut output = Vec::new();

        let outcome = session.run(input, &mut output).unwrap();
        assert_eq!(outcome.asked.len(), 1);
        assert_eq!(outcome.evidence.onset_speed, Some(Onset::Gradual));
        assert!(matches!(
            outcome.stop,
            StopReason::EndOfInput | StopReason::Confident | StopReason::NoInformativeQuestion
        ));
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("suddenly"));
    }

    #[test]
    fn test_run_reprompts_and_quits() {
        let engine = engine();
        let session = Session::new(&engine, PatientContext::default(), SymptomEvidence::new());
        let input = Cursor::new("sometimes\nq\n");
        let mut output = Vec::new();

        let outcome = session.run(input, &mut output).unwrap();
        assert_eq!(outcome.stop, StopReason::UserQuit);
        assert!(outcome.asked.is_empty());
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Please answer sudden or gradual"));
    }

    #[test]
    fn test_question_limit() {
        let mut config = EngineConfig::default();
        config.questioning.max_questions = 1;
        config.questioning.stop_entropy = 0.0;
        let engine = DifferentialEngine::urology(config).unwrap();
        let session = Session::new(&engine, PatientContext::new(40, Gender::Female), SymptomEvidence::new());
        let input = Cursor::new("sudden\nyes\nyes\n");

        let outcome = session.run(input, Vec::new()).unwrap();
        assert_eq!(outcome.stop, StopReason::QuestionLimit);
        assert_eq!(outcome.asked.len(), 1);
    }
}
