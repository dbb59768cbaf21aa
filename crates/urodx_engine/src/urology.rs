//! Built-in urology catalog.
//!
//! Seven conditions, fourteen symptom nodes, epidemiological prior bands,
//! published log-odds points and the recommendation decision table.

use crate::catalog::{
    Catalog, Confidence, ConditionDef, ConditionDelta, ContinuousEffect, ContinuousRule,
    DiscreteRule, InitialQuestion, InitialTarget, PriorBand, PriorMatch, PriorRule,
    RecommendationBundle, SymptomDef, SymptomEdge, Trigger, UncertainBundle, Urgency,
};
use crate::curve::ResponseCurve;
use crate::error::Result;
use crate::evidence::{AnswerType, CountField, EvidenceProbe, Finding, Onset, SeverityField};
use crate::patient::{Gender, RiskFlag};

fn edges(pairs: &[(&str, f64)]) -> Vec<SymptomEdge> {
    pairs
        .iter()
        .map(|(symptom, weight)| SymptomEdge {
            symptom: symptom.to_string(),
            weight: *weight,
        })
        .collect()
}

fn deltas(pairs: &[(&str, f64)]) -> Vec<ConditionDelta> {
    pairs
        .iter()
        .map(|(condition, delta)| ConditionDelta {
            condition: condition.to_string(),
            delta: *delta,
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn condition(id: &str, label: &str, pattern: &str, pairs: &[(&str, f64)]) -> ConditionDef {
    ConditionDef {
        id: id.to_string(),
        label: label.to_string(),
        pattern: pattern.to_string(),
        edges: edges(pairs),
    }
}

fn symptom(id: &str, label: &str, probe: EvidenceProbe, question: &str, answer_type: AnswerType) -> SymptomDef {
    SymptomDef {
        id: id.to_string(),
        label: label.to_string(),
        probe,
        question: question.to_string(),
        answer_type,
    }
}

fn band(gender: Option<Gender>, min_age: Option<u32>, risk: Option<RiskFlag>, prior: f64) -> PriorBand {
    PriorBand {
        when: PriorMatch {
            gender,
            min_age,
            risk,
        },
        prior,
    }
}

fn conditions() -> Vec<ConditionDef> {
    vec![
        condition(
            "uti",
            "Urinary tract infection",
            "Acute onset of burning, frequency and urgency",
            &[
                ("frequency", 0.90),
                ("urgency", 0.90),
                ("nocturia", 0.70),
                ("pain_burning", 0.95),
                ("recurrent_utis", 0.80),
                ("fever", 0.85),
            ],
        ),
        condition(
            "bph",
            "Benign prostatic hyperplasia",
            "Gradual voiding symptoms in older men",
            &[
                ("frequency", 0.85),
                ("urgency", 0.80),
                ("weak_stream", 0.95),
                ("incomplete_emptying", 0.90),
                ("intermittency", 0.85),
                ("straining", 0.90),
                ("nocturia", 0.90),
            ],
        ),
        condition(
            "prostate_cancer",
            "Prostate cancer",
            "Often silent; obstructive symptoms when advanced",
            &[
                ("frequency", 0.60),
                ("urgency", 0.60),
                ("weak_stream", 0.75),
                ("incomplete_emptying", 0.70),
                ("intermittency", 0.60),
                ("straining", 0.65),
                ("nocturia", 0.70),
                ("blood_in_urine", 0.75),
                ("family_history_prostate_cancer", 0.95),
            ],
        ),
        condition(
            "overactive_bladder",
            "Overactive bladder",
            "Urgency with frequency and nocturia, no infection",
            &[("frequency", 0.90), ("urgency", 0.95), ("nocturia", 0.80)],
        ),
        condition(
            "kidney_stones",
            "Kidney stones",
            "Sudden severe colicky pain with blood in urine",
            &[("blood_in_urine", 0.90), ("severe_pain", 0.98), ("pelvic_pain", 0.85)],
        ),
        condition(
            "interstitial_cystitis",
            "Interstitial cystitis",
            "Chronic bladder pain with frequency, sterile urine",
            &[
                ("frequency", 0.90),
                ("urgency", 0.85),
                ("nocturia", 0.80),
                ("pain_burning", 0.95),
                ("blood_in_urine", 0.60),
                ("severe_pain", 0.90),
                ("pelvic_pain", 0.95),
            ],
        ),
        condition(
            "prostatitis",
            "Prostatitis",
            "Pelvic pain with voiding symptoms, fever when acute",
            &[
                ("frequency", 0.85),
                ("urgency", 0.85),
                ("weak_stream", 0.75),
                ("incomplete_emptying", 0.75),
                ("intermittency", 0.70),
                ("straining", 0.75),
                ("nocturia", 0.80),
                ("pain_burning", 0.90),
                ("severe_pain", 0.85),
                ("pelvic_pain", 0.95),
                ("fever", 0.90),
            ],
        ),
    ]
}

fn symptoms() -> Vec<SymptomDef> {
    use AnswerType::{Count, Scale0To10, YesNo};
    use EvidenceProbe::Reported;

    vec![
        symptom("frequency", "Frequent urination", Reported, "Do you need to urinate more often than usual?", YesNo),
        symptom("urgency", "Urgency", Reported, "Do you get sudden urges to urinate that are hard to hold?", YesNo),
        symptom(
            "nocturia",
            "Waking at night to urinate",
            EvidenceProbe::Count { field: CountField::NocturiaPerNight },
            "How many times do you wake up at night to urinate?",
            Count,
        ),
        symptom(
            "pain_burning",
            "Pain or burning when urinating",
            EvidenceProbe::Finding { finding: Finding::Dysuria },
            "Do you have pain or burning when urinating?",
            YesNo,
        ),
        symptom("recurrent_utis", "Recurrent urine infections", Reported, "Have you had repeated urine infections in the past year?", YesNo),
        symptom(
            "weak_stream",
            "Weak urine stream",
            EvidenceProbe::Severity { field: SeverityField::WeakStream },
            "On a scale of 0-10, how weak is your urine stream?",
            Scale0To10,
        ),
        symptom(
            "incomplete_emptying",
            "Incomplete emptying",
            Reported,
            "Does your bladder still feel full after you finish urinating?",
            YesNo,
        ),
        symptom("intermittency", "Intermittent stream", Reported, "Does your stream stop and start while urinating?", YesNo),
        symptom("straining", "Straining to urinate", Reported, "Do you have to push or strain to start urinating?", YesNo),
        symptom(
            "blood_in_urine",
            "Blood in urine",
            EvidenceProbe::Finding { finding: Finding::Hematuria },
            "Have you noticed any blood in your urine, even if just once?",
            YesNo,
        ),
        symptom(
            "family_history_prostate_cancer",
            "Family history of prostate cancer",
            EvidenceProbe::History { flag: RiskFlag::FamilyHistoryProstateCancer },
            "Does anyone in your immediate family have a history of prostate cancer?",
            YesNo,
        ),
        symptom(
            "severe_pain",
            "Severe pain",
            EvidenceProbe::Severity { field: SeverityField::Pain },
            "On a scale of 0-10, how severe is the pain?",
            Scale0To10,
        ),
        symptom("pelvic_pain", "Pelvic pain", Reported, "Do you have pain in your pelvis or lower abdomen?", YesNo),
        symptom(
            "fever",
            "Fever",
            EvidenceProbe::Finding { finding: Finding::Fever },
            "Do you have a fever or feel generally very unwell?",
            YesNo,
        ),
    ]
}

fn priors() -> Vec<PriorRule> {
    use Gender::{Female, Male};

    vec![
        PriorRule {
            condition: "uti".into(),
            default: 0.05,
            bands: vec![band(Some(Female), None, None, 0.30)],
            citation: "Lifetime UTI risk ~50-60% women, ~13% men. Annual ~10-20% women. Women get UTIs 30x more than men.".into(),
        },
        PriorRule {
            condition: "bph".into(),
            default: 0.001,
            bands: vec![
                band(Some(Male), Some(70), None, 0.85),
                band(Some(Male), Some(60), None, 0.60),
                band(Some(Male), Some(50), None, 0.26),
                band(Some(Male), None, None, 0.10),
            ],
            citation: "Histological BPH: ~50-70% in 60s, ~80-90% >70. Survey data: 70% LUTS ages 60-69, >80% over 70.".into(),
        },
        PriorRule {
            condition: "prostate_cancer".into(),
            default: 0.001,
            bands: vec![
                band(Some(Male), None, Some(RiskFlag::FamilyHistoryProstateCancer), 0.20),
                band(Some(Male), Some(65), None, 0.08),
                band(Some(Male), None, None, 0.002),
            ],
            citation: "Lifetime risk 1 in 8 (12-13%). <0.5% before age 50, ~6.5% by age 70-79. Family history doubles risk.".into(),
        },
        PriorRule {
            condition: "overactive_bladder".into(),
            default: 0.16,
            bands: vec![band(Some(Female), None, None, 0.17), band(Some(Male), None, None, 0.16)],
            citation: "EPIC study: 11.8% overall (10.8% men, 12.8% women). NOBLE study: 16% overall (16.0% men, 16.9% women).".into(),
        },
        PriorRule {
            condition: "kidney_stones".into(),
            default: 0.10,
            bands: vec![band(None, None, Some(RiskFlag::PreviousKidneyStones), 0.50)],
            citation: "Overall prevalence ~8.8-10% (10.6% men, 7.1% women). Recurrence 35-50% within 5 years, ~75% within 20 years.".into(),
        },
        PriorRule {
            condition: "interstitial_cystitis".into(),
            default: 0.03,
            bands: vec![band(Some(Female), None, None, 0.05), band(Some(Male), None, None, 0.015)],
            citation: "Symptom-based prevalence women: 2.7% (strict) to 6.5% (broad). Female:male ratio ~5:1.".into(),
        },
        PriorRule {
            condition: "prostatitis".into(),
            default: 0.05,
            bands: vec![],
            citation: "Prevalence estimates vary; chronic forms in few percent of men. Acute bacterial prostatitis uncommon.".into(),
        },
    ]
}

fn discrete_rules() -> Vec<DiscreteRule> {
    vec![
        DiscreteRule {
            name: "sudden_onset".into(),
            trigger: Trigger::Onset { onset: Onset::Sudden },
            deltas: deltas(&[
                ("uti", 5.0),
                ("kidney_stones", 5.0),
                ("bph", -4.0),
                ("prostate_cancer", -4.0),
                ("overactive_bladder", -2.0),
                ("interstitial_cystitis", -2.0),
                ("prostatitis", 2.0),
            ]),
            citation: "Clinical: UTI/stones typically <48hr onset. BPH develops over years. ~85% UTI acute vs ~10% BPH acute → LR~8.5.".into(),
        },
        DiscreteRule {
            name: "gradual_progression".into(),
            trigger: Trigger::Onset { onset: Onset::Gradual },
            deltas: deltas(&[
                ("bph", 5.0),
                ("prostate_cancer", 4.0),
                ("overactive_bladder", 3.0),
                ("interstitial_cystitis", 3.0),
                ("uti", -5.0),
                ("kidney_stones", -5.0),
                ("prostatitis", -3.0),
            ]),
            citation: "BPH: gradual LUTS over years (guideline). UTI/stones: acute <48hr onset. Inverse of sudden_onset.".into(),
        },
        DiscreteRule {
            name: "dysuria".into(),
            trigger: Trigger::Present { finding: Finding::Dysuria },
            deltas: deltas(&[
                ("uti", 1.5),
                ("prostatitis", 2.0),
                ("kidney_stones", 1.0),
                ("interstitial_cystitis", 2.0),
                ("bph", -1.0),
                ("overactive_bladder", -2.0),
                ("prostate_cancer", -1.0),
            ]),
            citation: "Bent et al JAMA 2002: Dysuria sens ~75%, spec ~50%, LR+ 1.5, LR− 0.5 for UTI.".into(),
        },
        DiscreteRule {
            name: "hematuria".into(),
            trigger: Trigger::Present { finding: Finding::Hematuria },
            deltas: deltas(&[
                ("kidney_stones", 6.0),
                ("uti", 1.5),
                ("prostate_cancer", 2.0),
                ("interstitial_cystitis", 2.0),
                ("bph", 0.5),
                ("overactive_bladder", -2.0),
            ]),
            citation: "Stones: ~85% with hematuria. Bladder cancer: ~85% painless hematuria. UTI: ~20-30%, LR+ 1.7.".into(),
        },
        DiscreteRule {
            name: "fever".into(),
            trigger: Trigger::Present { finding: Finding::Fever },
            deltas: deltas(&[
                ("uti", -2.0),
                ("prostatitis", 7.0),
                ("bph", -8.0),
                ("overactive_bladder", -6.0),
                ("prostate_cancer", -4.0),
                ("interstitial_cystitis", -4.0),
                ("kidney_stones", 0.0),
            ]),
            citation: "Cystitis usually no fever. Pyelonephritis/acute prostatitis: fever >80%. BPH: 0% (fever suggests infection).".into(),
        },
        DiscreteRule {
            name: "nocturia_severe".into(),
            trigger: Trigger::CountAtLeast {
                field: CountField::NocturiaPerNight,
                threshold: 3,
            },
            deltas: deltas(&[
                ("bph", 3.0),
                ("overactive_bladder", 3.0),
                ("prostate_cancer", 2.0),
                ("uti", 1.0),
                ("interstitial_cystitis", 2.0),
            ]),
            citation: "Nocturia common in BPH (obstruction) and OAB (urgency). IPSS Q7 severity marker.".into(),
        },
    ]
}

fn continuous_rules() -> Vec<ContinuousRule> {
    vec![
        ContinuousRule {
            name: "dysuria_severity".into(),
            field: SeverityField::Dysuria,
            gate: 0,
            primary: ResponseCurve::sigmoid(1.0, 50.0, 0.062),
            alternative: Some(ResponseCurve::Above {
                threshold: 70.0,
                value: 0.3,
                curve: Box::new(ResponseCurve::gaussian(0.6, 40.0, 225.0)),
            }),
            effects: vec![
                ContinuousEffect {
                    condition: "uti".into(),
                    weight: 0.5,
                    likelihood_scale: 1.0,
                },
                ContinuousEffect {
                    condition: "prostatitis".into(),
                    weight: 0.3,
                    likelihood_scale: 1.0,
                },
                ContinuousEffect {
                    condition: "bph".into(),
                    weight: -0.3,
                    likelihood_scale: 1.0,
                },
            ],
        },
        ContinuousRule {
            name: "weak_stream_severity".into(),
            field: SeverityField::WeakStream,
            gate: 0,
            primary: ResponseCurve::Sum {
                terms: vec![
                    ResponseCurve::sigmoid(0.4, 35.0, 0.1),
                    ResponseCurve::gaussian(0.6, 80.0, 500.0),
                ],
            },
            alternative: None,
            effects: vec![
                ContinuousEffect {
                    condition: "bph".into(),
                    weight: 0.5,
                    likelihood_scale: 1.0,
                },
                ContinuousEffect {
                    condition: "prostate_cancer".into(),
                    weight: 0.3,
                    likelihood_scale: 0.7,
                },
            ],
        },
        ContinuousRule {
            name: "severe_pain".into(),
            field: SeverityField::Pain,
            gate: 70,
            primary: ResponseCurve::Below {
                threshold: 60.0,
                value: 0.05,
                curve: Box::new(ResponseCurve::sigmoid(1.0, 70.0, 0.3)),
            },
            alternative: None,
            effects: vec![ContinuousEffect {
                condition: "kidney_stones".into(),
                weight: 0.7,
                likelihood_scale: 1.0,
            }],
        },
    ]
}

fn recommendations() -> Vec<RecommendationBundle> {
    vec![
        RecommendationBundle {
            condition: "uti".into(),
            threshold: 0.65,
            primary_diagnosis: "Likely urinary tract infection".into(),
            confidence: Confidence::High,
            action: "See GP this week for urine test and antibiotics".into(),
            urgency: Urgency::Routine,
            self_care: strings(&[
                "Drink plenty of water (2-3 liters per day)",
                "Try cranberry juice",
                "Take paracetamol for discomfort",
                "Avoid caffeine and alcohol",
            ]),
            red_flags: "See GP urgently if fever develops, severe back pain, or vomiting".into(),
            investigations: strings(&["urine culture"]),
            procedures: vec![],
        },
        RecommendationBundle {
            condition: "bph".into(),
            threshold: 0.60,
            primary_diagnosis: "Symptoms suggest benign prostate enlargement (BPH)".into(),
            confidence: Confidence::ModerateHigh,
            action: "Book routine urology assessment".into(),
            urgency: Urgency::Routine,
            self_care: strings(&[
                "Reduce caffeine and alcohol intake, especially before bed",
                "Practice double voiding (wait 30 seconds and try again)",
                "Avoid decongestants (can worsen symptoms)",
                "Consider saw palmetto (some evidence of benefit)",
            ]),
            red_flags: "See GP urgently if unable to urinate, blood in urine, or severe pain".into(),
            investigations: strings(&["PSA", "prostate exam (DRE)", "uroflowmetry"]),
            procedures: strings(&["medication", "TURP", "HIFU", "laser therapy"]),
        },
        RecommendationBundle {
            condition: "kidney_stones".into(),
            threshold: 0.70,
            primary_diagnosis: "Symptoms suggest possible kidney stones".into(),
            confidence: Confidence::High,
            action: "See GP within 24 hours for pain relief and imaging".into(),
            urgency: Urgency::Urgent,
            self_care: strings(&[
                "Drink lots of water (helps small stones pass)",
                "Take ibuprofen or paracetamol for pain",
                "Apply heat to affected area",
            ]),
            red_flags: "Go to A&E if severe uncontrolled pain, fever, or vomiting".into(),
            investigations: strings(&["CT KUB", "renal function"]),
            procedures: strings(&["watchful waiting", "shock wave lithotripsy", "ureteroscopy"]),
        },
        RecommendationBundle {
            condition: "prostatitis".into(),
            threshold: 0.60,
            primary_diagnosis: "Symptoms suggest prostatitis".into(),
            confidence: Confidence::ModerateHigh,
            action: "See GP within 24 hours for examination and antibiotics".into(),
            urgency: Urgency::Urgent,
            self_care: strings(&[
                "Drink plenty of fluids",
                "Take paracetamol or ibuprofen for pain and fever",
                "Sit on a soft cushion",
            ]),
            red_flags: "Go to A&E if unable to urinate, shivering, or feeling very unwell".into(),
            investigations: strings(&["urine culture", "blood tests"]),
            procedures: vec![],
        },
        RecommendationBundle {
            condition: "prostate_cancer".into(),
            threshold: 0.50,
            primary_diagnosis: "Symptoms and risk factors warrant prostate cancer assessment".into(),
            confidence: Confidence::Moderate,
            action: "See GP within 2 weeks to discuss PSA testing".into(),
            urgency: Urgency::Soon,
            self_care: strings(&["Keep a diary of urinary symptoms"]),
            red_flags: "See GP urgently if blood in urine, bone pain, or unexplained weight loss".into(),
            investigations: strings(&["PSA", "prostate exam (DRE)", "MRI prostate"]),
            procedures: vec![],
        },
        RecommendationBundle {
            condition: "overactive_bladder".into(),
            threshold: 0.60,
            primary_diagnosis: "Symptoms suggest overactive bladder".into(),
            confidence: Confidence::Moderate,
            action: "Book routine GP appointment for bladder assessment".into(),
            urgency: Urgency::Routine,
            self_care: strings(&[
                "Bladder training (gradually extend time between visits)",
                "Pelvic floor exercises",
                "Reduce caffeine, alcohol and fizzy drinks",
            ]),
            red_flags: "See GP urgently if blood in urine, fever, or pain when urinating".into(),
            investigations: strings(&["bladder diary"]),
            procedures: strings(&["bladder training", "medication", "botox injections"]),
        },
        RecommendationBundle {
            condition: "interstitial_cystitis".into(),
            threshold: 0.60,
            primary_diagnosis: "Symptoms suggest interstitial cystitis (bladder pain syndrome)".into(),
            confidence: Confidence::Moderate,
            action: "Book routine GP appointment; referral to urology may be needed".into(),
            urgency: Urgency::Routine,
            self_care: strings(&[
                "Avoid trigger foods (citrus, spicy food, caffeine)",
                "Apply heat to lower abdomen",
                "Keep a symptom diary",
            ]),
            red_flags: "See GP urgently if fever, blood in urine, or unable to urinate".into(),
            investigations: strings(&["urine culture", "cystoscopy"]),
            procedures: vec![],
        },
    ]
}

fn uncertain() -> UncertainBundle {
    UncertainBundle {
        action: "Recommend GP assessment for proper evaluation".into(),
        self_care: strings(&["Monitor symptoms", "Stay hydrated"]),
        red_flags: "Seek urgent care if symptoms worsen or new symptoms develop".into(),
        note: "Additional questions needed to narrow down diagnosis".into(),
    }
}

fn initial_questions() -> Vec<InitialQuestion> {
    vec![
        InitialQuestion {
            target: InitialTarget::OnsetSpeed,
            question: "Did your symptoms start suddenly (hours/days) or gradually over weeks/months?".into(),
            answer_type: AnswerType::Categorical,
            information_gain: 0.8,
            rationale: "Onset speed strongly differentiates acute (UTI/stones) from chronic (BPH/OAB) conditions".into(),
        },
        InitialQuestion {
            target: InitialTarget::Symptom {
                id: "pain_burning".into(),
            },
            question: "Do you have pain or burning when urinating?".into(),
            answer_type: AnswerType::YesNo,
            information_gain: 0.7,
            rationale: "Dysuria is highly specific for infection or inflammation".into(),
        },
    ]
}

impl Catalog {
    /// Built-in urology tables
    pub fn urology() -> Result<Catalog> {
        Catalog::new(
            "urology",
            conditions(),
            symptoms(),
            priors(),
            discrete_rules(),
            continuous_rules(),
            recommendations(),
            uncertain(),
            initial_questions(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::urology().unwrap();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.symptoms.len(), 14);
        assert_eq!(catalog.recommendations.len(), 7);
    }

    #[test]
    fn test_every_condition_has_a_bundle() {
        let catalog = Catalog::urology().unwrap();
        for id in catalog.condition_ids() {
            assert!(
                catalog.recommendations.iter().any(|b| b.condition == id),
                "missing bundle for {}",
                id
            );
        }
    }

    #[test]
    fn test_citations_are_unique() {
        let catalog = Catalog::urology().unwrap();
        let citations = catalog.citations();
        assert_eq!(citations.len(), 13);
        assert!(citations.iter().any(|c| c.contains("Bent et al")));
    }

    #[test]
    fn test_toml_round_trip_preserves_tables() {
        let catalog = Catalog::urology().unwrap();
        let text = catalog.to_toml_string().unwrap();
        let loaded = Catalog::from_toml_str(&text).unwrap();
        assert_eq!(loaded.conditions, catalog.conditions);
        assert_eq!(loaded.discrete_rules, catalog.discrete_rules);
        assert_eq!(loaded.continuous_rules, catalog.continuous_rules);
    }
}
