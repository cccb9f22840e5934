// Question and batch types shared by the generator, fallback bank and grader.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answer: f64,
}

impl Question {
    pub fn new(text: impl Into<String>, answer: f64) -> Self {
        Question {
            text: text.into(),
            answer,
        }
    }
}

/// Where a batch of questions came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Llm,
    /// The built-in bank, used because the LLM request failed or returned
    /// nothing usable.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,
    pub origin: Origin,
}

impl QuestionBatch {
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.origin {
            Origin::Llm => None,
            Origin::Fallback { reason } => Some(reason),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
