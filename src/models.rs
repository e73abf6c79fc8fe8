use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

/// Discriminator stored in `questions.qtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
}

impl QuestionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "multiple_choice" => Some(QuestionKind::MultipleChoice),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question {0} has no correct answers")]
    NoCorrectAnswers(i64),
    #[error("question {0} has no incorrect answers")]
    NoIncorrectAnswers(i64),
    #[error("question {id} has unknown type `{tag}`")]
    UnknownKind { id: i64, tag: String },
    #[error("question {0} is missing its multiple choice answers")]
    MissingAnswers(i64),
    #[error("question {id} has a choice containing a comma: `{choice}`")]
    CommaInChoice { id: i64, choice: String },
}

/// A question as served by the store, already resolved to its concrete variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    MultipleChoice(MultipleChoice),
}

impl Question {
    pub fn id(&self) -> i64 {
        match self {
            Question::MultipleChoice(mc) => mc.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice(mc) => &mc.text,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
        }
    }

    pub fn as_multiple_choice(&self) -> Option<&MultipleChoice> {
        match self {
            Question::MultipleChoice(mc) => Some(mc),
        }
    }
}

/// A question whose answers are picked from a list of choices.
///
/// Both answer lists are guaranteed non-empty. Keeping the correct and
/// incorrect sets disjoint is up to whoever writes the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleChoice {
    id: i64,
    text: String,
    correct: Vec<String>,
    incorrect: Vec<String>,
}

impl MultipleChoice {
    pub fn new(
        id: i64,
        text: String,
        correct: Vec<String>,
        incorrect: Vec<String>,
    ) -> Result<Self, QuestionError> {
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswers(id));
        }
        if incorrect.is_empty() {
            return Err(QuestionError::NoIncorrectAnswers(id));
        }
        // Choices are stored comma-joined.
        if let Some(choice) = correct.iter().chain(&incorrect).find(|c| c.contains(',')) {
            return Err(QuestionError::CommaInChoice {
                id,
                choice: choice.clone(),
            });
        }
        Ok(Self {
            id,
            text,
            correct,
            incorrect,
        })
    }

    /// Builds a question from the comma-joined answer columns.
    pub fn from_joined(
        id: i64,
        text: String,
        correct: &str,
        incorrect: &str,
    ) -> Result<Self, QuestionError> {
        Self::new(id, text, split_choices(correct), split_choices(incorrect))
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn correct(&self) -> &[String] {
        &self.correct
    }

    pub fn incorrect(&self) -> &[String] {
        &self.incorrect
    }
}

/// Splits a comma-joined answer column, trimming each choice and dropping blanks.
pub fn split_choices(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn join_choices(choices: &[String]) -> String {
    choices.join(", ")
}

pub type QuestionBank = Vec<QuestionImport>;

/// One entry of a JSON question bank file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionImport {
    pub text: String,
    pub topics: Vec<String>,
    pub correct: Vec<String>,
    pub incorrect: Vec<String>,
}
