// Parser for the line-oriented `Q:` / `A:` reply format.

use crate::question::Question;

/// Extract question/answer pairs from an LLM reply.
///
/// A `Q:` line sets the pending question; an `A:` line with a pending
/// question emits a pair if its value is a finite number. An unparsable
/// answer leaves the question pending. Everything else is ignored.
pub fn parse_math_response(text: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut pending: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if let Some(q) = line.strip_prefix("Q:") {
            pending = Some(q.trim().to_string());
        } else if let Some(a) = line.strip_prefix("A:") {
            let Some(question) = pending.as_ref().filter(|q| !q.is_empty()) else {
                continue;
            };
            if let Some(answer) = parse_number(a) {
                questions.push(Question::new(question.clone(), answer));
                pending = None;
            }
        }
    }
    questions
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
