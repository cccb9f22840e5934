pub mod fallback;
pub mod generator;
pub mod grading;
pub mod parse;
pub mod prompt;
pub mod question;

pub use generator::generate_questions;
pub use question::{Origin, Question, QuestionBatch};
