// Database row structs

use serde::Deserialize;

use crate::models::{MultipleChoice, Question, QuestionError, QuestionKind};

/// A `questions` row joined with its subtype table.
#[derive(Deserialize)]
pub struct QuestionRow {
    pub id: i64,
    pub text: String,
    pub qtype: String,
    pub correct: Option<String>,
    pub incorrect: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = QuestionError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let kind = QuestionKind::parse(&row.qtype).ok_or_else(|| QuestionError::UnknownKind {
            id: row.id,
            tag: row.qtype.clone(),
        })?;

        match kind {
            QuestionKind::MultipleChoice => {
                let (Some(correct), Some(incorrect)) = (row.correct, row.incorrect) else {
                    return Err(QuestionError::MissingAnswers(row.id));
                };
                MultipleChoice::from_joined(row.id, row.text, &correct, &incorrect)
                    .map(Question::MultipleChoice)
            }
        }
    }
}

#[derive(Deserialize)]
pub struct SessionEntryRow {
    pub key: String,
    pub value: String,
}
