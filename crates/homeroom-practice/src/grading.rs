// Answer grading for a practice session.

use homeroom_core::history::{AnswerRecord, SessionRecord};

use crate::question::Question;

/// Answers within this distance of the expected value count as correct.
pub const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question: String,
    /// `None` when the input was empty or not a number.
    pub given: Option<f64>,
    pub expected: f64,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedSession {
    pub results: Vec<GradedAnswer>,
    pub score: u32,
    pub total: u32,
}

impl GradedSession {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }

    pub fn to_record(&self, timestamp: String) -> SessionRecord {
        SessionRecord {
            score: self.score,
            total: self.total,
            timestamp,
            results: self
                .results
                .iter()
                .map(|r| AnswerRecord {
                    q: r.question.clone(),
                    ans: r.given,
                    correct: r.expected,
                })
                .collect(),
        }
    }
}

/// Interpret typed input as a number.
pub fn parse_answer(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Grade `answers` against `questions` position by position. Missing
/// answers count as wrong.
pub fn grade(questions: &[Question], answers: &[String]) -> GradedSession {
    let results: Vec<GradedAnswer> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let given = answers.get(i).and_then(|a| parse_answer(a));
            let correct = given.is_some_and(|g| (g - q.answer).abs() <= TOLERANCE);
            GradedAnswer {
                question: q.text.clone(),
                given,
                expected: q.answer,
                correct,
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.correct).count() as u32;
    let total = results.len() as u32;
    GradedSession {
        results,
        score,
        total,
    }
}
