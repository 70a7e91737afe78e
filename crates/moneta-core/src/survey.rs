//! Risk-profile survey: questionnaire data, the linear session state
//! machine, and the score-to-category mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// One selectable answer with its score weight.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOption {
    /// Display label for the option.
    pub label: &'static str,
    /// Weight added to the running score when selected.
    pub weight: f64,
}

/// How a question accepts answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Exactly one option; selecting it scores and advances immediately.
    Single,
    /// A non-empty subset of options, committed in one step.
    Multi,
}

/// One survey question.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    /// Guidance text shown above the prompt.
    pub guidance: &'static str,
    /// The question itself.
    pub prompt: &'static str,
    /// Single- or multi-select.
    pub kind: QuestionKind,
    /// Ordered answer options.
    pub options: &'static [AnswerOption],
}

const GUIDANCE: &str =
    "Answer the following seven questions so we can assess your investment risk profile.";

const QUESTIONS: &[Question] = &[
    Question {
        guidance: GUIDANCE,
        prompt: "Question 1: Which age group do you belong to?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption { label: "19 or younger", weight: 12.5 },
            AnswerOption { label: "20 to 40", weight: 12.5 },
            AnswerOption { label: "41 to 50", weight: 9.3 },
            AnswerOption { label: "50 to 60", weight: 6.2 },
            AnswerOption { label: "61 or older", weight: 3.1 },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 2: How long can the money stay invested?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption { label: "Under 6 months", weight: 3.1 },
            AnswerOption { label: "6 months to 1 year", weight: 6.2 },
            AnswerOption { label: "1 to 2 years", weight: 9.3 },
            AnswerOption { label: "2 to 3 years", weight: 12.5 },
            AnswerOption { label: "3 years or longer", weight: 15.6 },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 3: Which of these is closest to your investment experience? (select all that apply)",
        kind: QuestionKind::Multi,
        options: &[
            AnswerOption {
                label: "Bank deposits, government and municipal bonds, guaranteed bonds, MMF, CMA",
                weight: 3.1,
            },
            AnswerOption {
                label: "Financial bonds, high-grade corporate bonds, bond funds, principal-protected ELS",
                weight: 6.2,
            },
            AnswerOption {
                label: "Mid-grade corporate bonds, partially protected ELS, balanced funds",
                weight: 9.3,
            },
            AnswerOption {
                label: "Low-grade corporate bonds, stocks, unprotected ELS, market-return equity funds",
                weight: 12.5,
            },
            AnswerOption {
                label: "ELW, futures and options, above-market equity funds, derivative funds, margin trading",
                weight: 15.6,
            },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 4: How would you rate your knowledge of financial products?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption {
                label: "[Very low] Never made an investment decision on my own",
                weight: 3.1,
            },
            AnswerOption {
                label: "[Low] Can tell stocks apart from bonds",
                weight: 6.2,
            },
            AnswerOption {
                label: "[High] Can tell most investable financial products apart",
                weight: 9.3,
            },
            AnswerOption {
                label: "[Very high] Understand the differences between all investment products",
                weight: 12.5,
            },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 5: What share of your financial assets (excluding real estate) does this money represent?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption { label: "Under 10%", weight: 1.0 },
            AnswerOption { label: "10% to 20%", weight: 2.0 },
            AnswerOption { label: "20% to 30%", weight: 3.0 },
            AnswerOption { label: "30% to 40%", weight: 4.0 },
            AnswerOption { label: "40% or more", weight: 5.0 },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 6: Which best describes your source of income?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption {
                label: "Steady income now, expected to hold or grow",
                weight: 9.3,
            },
            AnswerOption {
                label: "Steady income now, expected to shrink or become unstable",
                weight: 6.2,
            },
            AnswerOption {
                label: "No steady income; a pension is the main source",
                weight: 3.1,
            },
        ],
    },
    Question {
        guidance: GUIDANCE,
        prompt: "Question 7: If your principal lost value, how much loss could you absorb?",
        kind: QuestionKind::Single,
        options: &[
            AnswerOption {
                label: "The principal must be preserved no matter what",
                weight: 6.2,
            },
            AnswerOption {
                label: "Could absorb a loss under 10%",
                weight: 6.2,
            },
            AnswerOption {
                label: "Could absorb a loss under 20%",
                weight: 12.5,
            },
            AnswerOption {
                label: "High risk is fine if the expected return is high",
                weight: 18.7,
            },
        ],
    },
];

/// The fixed, ordered questionnaire driven by `SurveySession`.
pub fn risk_questionnaire() -> &'static [Question] {
    QUESTIONS
}

/// Investment risk category derived from the total survey score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    Stable,
    StableSeeking,
    Neutral,
    AggressiveInvest,
    Aggressive,
}

impl RiskCategory {
    /// Bucket a total score with the fixed thresholds: ≤20 stable,
    /// (20,40] stable-seeking, (40,60] neutral, (60,80] aggressive-invest,
    /// >80 aggressive.
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            RiskCategory::Stable
        } else if score <= 40.0 {
            RiskCategory::StableSeeking
        } else if score <= 60.0 {
            RiskCategory::Neutral
        } else if score <= 80.0 {
            RiskCategory::AggressiveInvest
        } else {
            RiskCategory::Aggressive
        }
    }

    /// The wire label reported to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Stable => "stable",
            RiskCategory::StableSeeking => "stable-seeking",
            RiskCategory::Neutral => "neutral",
            RiskCategory::AggressiveInvest => "aggressive-invest",
            RiskCategory::Aggressive => "aggressive",
        }
    }

    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            RiskCategory::Stable => "Stable",
            RiskCategory::StableSeeking => "Stability-seeking",
            RiskCategory::Neutral => "Risk-neutral",
            RiskCategory::AggressiveInvest => "Active investor",
            RiskCategory::Aggressive => "Aggressive investor",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by survey session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurveyError {
    /// Option index does not exist on the current question.
    #[error("option index out of range: {0}")]
    OptionOutOfRange(usize),
    /// `answer` was called on the multi-select question.
    #[error("question {0} requires the multi-select flow")]
    NotSingleChoice(usize),
    /// `toggle`/`commit_selection` was called on a single-choice question.
    #[error("question {0} accepts a single choice")]
    NotMultiChoice(usize),
    /// `commit_selection` was called with nothing selected.
    #[error("cannot advance with an empty selection")]
    EmptySelection,
    /// The last question has already been answered.
    #[error("survey is already complete")]
    Finished,
}

/// Result of a scoring step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyStep {
    /// Moved on to the next question.
    Advanced,
    /// The last question was answered; completion is now enabled.
    Armed,
}

/// Finite linear state machine over the questionnaire.
///
/// Starts at question 0 with score 0. Single-choice answers score and
/// advance in one step; the multi-select question collects a working set
/// that is committed explicitly. After the last answer the session is
/// "armed": the score is final and `category` becomes available.
#[derive(Debug, Clone)]
pub struct SurveySession {
    questions: &'static [Question],
    index: usize,
    score: f64,
    selection: BTreeSet<usize>,
    armed: bool,
}

impl SurveySession {
    /// Start a fresh survey over the fixed questionnaire.
    pub fn new() -> Self {
        Self {
            questions: risk_questionnaire(),
            index: 0,
            score: 0.0,
            selection: BTreeSet::new(),
            armed: false,
        }
    }

    /// Total number of questions.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Index of the question currently shown (stays on the last question
    /// once armed).
    pub fn index(&self) -> usize {
        self.index
    }

    /// The question currently shown.
    pub fn current(&self) -> &'static Question {
        &self.questions[self.index]
    }

    /// Whether the completion action is enabled.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Running score so far.
    pub fn total_score(&self) -> f64 {
        self.score
    }

    /// Whether an option is in the multi-select working set.
    pub fn is_selected(&self, option: usize) -> bool {
        self.selection.contains(&option)
    }

    /// Whether the multi-select commit is currently allowed.
    pub fn can_commit(&self) -> bool {
        self.current().kind == QuestionKind::Multi && !self.selection.is_empty() && !self.armed
    }

    /// Final category; available once the session is armed.
    pub fn category(&self) -> Option<RiskCategory> {
        self.armed.then(|| RiskCategory::from_score(self.score))
    }

    /// Answer the current single-choice question and advance.
    pub fn answer(&mut self, option: usize) -> Result<SurveyStep, SurveyError> {
        if self.armed {
            return Err(SurveyError::Finished);
        }
        let question = self.current();
        if question.kind != QuestionKind::Single {
            return Err(SurveyError::NotSingleChoice(self.index));
        }
        let chosen = question
            .options
            .get(option)
            .ok_or(SurveyError::OptionOutOfRange(option))?;
        self.score += chosen.weight;
        Ok(self.advance())
    }

    /// Toggle an option in the multi-select working set. No scoring happens
    /// until the selection is committed.
    pub fn toggle(&mut self, option: usize) -> Result<(), SurveyError> {
        if self.armed {
            return Err(SurveyError::Finished);
        }
        let question = self.current();
        if question.kind != QuestionKind::Multi {
            return Err(SurveyError::NotMultiChoice(self.index));
        }
        if option >= question.options.len() {
            return Err(SurveyError::OptionOutOfRange(option));
        }
        if !self.selection.remove(&option) {
            self.selection.insert(option);
        }
        Ok(())
    }

    /// Score every selected option, clear the working set, and advance.
    pub fn commit_selection(&mut self) -> Result<SurveyStep, SurveyError> {
        if self.armed {
            return Err(SurveyError::Finished);
        }
        let question = self.current();
        if question.kind != QuestionKind::Multi {
            return Err(SurveyError::NotMultiChoice(self.index));
        }
        if self.selection.is_empty() {
            return Err(SurveyError::EmptySelection);
        }
        for option in &self.selection {
            self.score += question.options[*option].weight;
        }
        self.selection.clear();
        Ok(self.advance())
    }

    fn advance(&mut self) -> SurveyStep {
        if self.index + 1 < self.questions.len() {
            self.index += 1;
            SurveyStep::Advanced
        } else {
            self.armed = true;
            SurveyStep::Armed
        }
    }
}

impl Default for SurveySession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        QuestionKind, RiskCategory, SurveyError, SurveySession, SurveyStep, risk_questionnaire,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn questionnaire_shape_is_fixed() {
        let questions = risk_questionnaire();
        assert_eq!(questions.len(), 7);
        assert_eq!(questions[2].kind, QuestionKind::Multi);
        for (index, question) in questions.iter().enumerate() {
            if index != 2 {
                assert_eq!(question.kind, QuestionKind::Single);
            }
            assert!(!question.options.is_empty());
        }
    }

    #[test]
    fn category_boundaries_follow_the_threshold_table() {
        assert_eq!(RiskCategory::from_score(20.0), RiskCategory::Stable);
        assert_eq!(RiskCategory::from_score(20.1), RiskCategory::StableSeeking);
        assert_eq!(RiskCategory::from_score(40.0), RiskCategory::StableSeeking);
        assert_eq!(RiskCategory::from_score(60.1), RiskCategory::AggressiveInvest);
        assert_eq!(RiskCategory::from_score(80.0), RiskCategory::AggressiveInvest);
        assert_eq!(RiskCategory::from_score(95.0), RiskCategory::Aggressive);
    }

    #[test]
    fn multi_select_commit_sums_and_clears() {
        let mut session = SurveySession::new();
        session.answer(0).expect("q1");
        session.answer(0).expect("q2");
        assert_eq!(session.index(), 2);

        let before = session.total_score();
        session.toggle(0).expect("toggle 0");
        session.toggle(2).expect("toggle 2");
        assert!(session.can_commit());
        assert_eq!(session.commit_selection().expect("commit"), SurveyStep::Advanced);

        let options = risk_questionnaire()[2].options;
        let expected = before + options[0].weight + options[2].weight;
        assert!((session.total_score() - expected).abs() < 1e-9);
        assert!(!session.is_selected(0));
        assert!(!session.is_selected(2));
        assert_eq!(session.index(), 3);
    }

    #[test]
    fn toggling_twice_removes_the_option() {
        let mut session = SurveySession::new();
        session.answer(0).expect("q1");
        session.answer(0).expect("q2");
        session.toggle(1).expect("toggle on");
        assert!(session.is_selected(1));
        session.toggle(1).expect("toggle off");
        assert!(!session.is_selected(1));
        assert_eq!(session.commit_selection(), Err(SurveyError::EmptySelection));
    }

    #[test]
    fn wrong_flow_for_question_kind_is_rejected() {
        let mut session = SurveySession::new();
        assert_eq!(session.toggle(0), Err(SurveyError::NotMultiChoice(0)));
        session.answer(0).expect("q1");
        session.answer(0).expect("q2");
        assert_eq!(session.answer(0), Err(SurveyError::NotSingleChoice(2)));
        assert_eq!(
            session.answer(99).err(),
            Some(SurveyError::NotSingleChoice(2))
        );
    }

    #[test]
    fn full_walkthrough_arms_completion() {
        let mut session = SurveySession::new();
        assert_eq!(session.category(), None);

        session.answer(0).expect("q1"); // 12.5
        session.answer(0).expect("q2"); // 3.1
        session.toggle(0).expect("q3 toggle");
        session.commit_selection().expect("q3 commit"); // 3.1
        session.answer(0).expect("q4"); // 3.1
        session.answer(0).expect("q5"); // 1.0
        session.answer(0).expect("q6"); // 9.3
        assert_eq!(session.answer(0).expect("q7"), SurveyStep::Armed); // 6.2

        assert!(session.is_armed());
        assert!((session.total_score() - 38.3).abs() < 1e-9);
        assert_eq!(session.category(), Some(RiskCategory::StableSeeking));
        assert_eq!(session.answer(0), Err(SurveyError::Finished));
    }
}
