use std::collections::BTreeMap;

use maud::{html, Markup};

use crate::{
    models::Question,
    names,
    services::round::{AnswerKeyEntry, Verdict},
};

pub fn quiz_started(question_count: usize, block_size: usize) -> Markup {
    html! {
        h1 { "Quiz ready" }
        @if question_count == 0 {
            p { "None of the chosen topics has questions yet." }
        } @else {
            p {
                (question_count) " questions are queued, "
                (block_size) " per round."
            }
        }
        button hx-get=(names::QUIZ_ROUND_URL)
               hx-target="main"
               hx-swap="innerHTML" {
            "Start first round"
        }
    }
}

pub struct RoundData<'a> {
    pub answer_key: &'a [AnswerKeyEntry],
    pub remaining: usize,
}

pub fn round(data: RoundData) -> Markup {
    html! {
        h1 { "Round" }
        form hx-post=(names::QUIZ_SUBMIT_URL)
             hx-target="main"
             hx-swap="innerHTML" {
            @for (idx, entry) in data.answer_key.iter().enumerate() {
                fieldset {
                    legend { (idx + 1) ". " (entry.question_text) }
                    @for (choice_idx, choice) in entry.presented_choices.iter().enumerate() {
                        label {
                            input type="radio" name=(names::answer_field(idx)) value=(choice_idx);
                            (choice)
                        }
                    }
                }
            }
            input type="submit" value="Submit answers";
        }
        @if data.remaining == 0 {
            p."hint" { "This is the final round." }
        } @else {
            p."hint" { (data.remaining) " questions left after this round." }
        }
    }
}

pub struct ResultsData<'a> {
    pub answer_key: &'a [AnswerKeyEntry],
    pub verdicts: &'a BTreeMap<usize, Verdict>,
    pub correct_count: usize,
    pub remaining: usize,
}

pub fn results(data: ResultsData) -> Markup {
    html! {
        h1 { "Results" }
        p { (data.correct_count) " of " (data.answer_key.len()) " correct." }
        ol {
            @for (idx, entry) in data.answer_key.iter().enumerate() {
                @let verdict = data.verdicts.get(&idx).copied();
                li class=(verdict.map_or("unanswered", Verdict::as_str)) {
                    p { (entry.question_text) }
                    p {
                        @match verdict {
                            Some(v) => {
                                strong { (v.as_str()) }
                            },
                            None => {
                                em { "unanswered" }
                            },
                        }
                        @if verdict != Some(Verdict::Correct) {
                            @if let Some(correct) = entry.correct_choice() {
                                " (answer: " (correct) ")"
                            }
                        }
                    }
                }
            }
        }
        @if data.remaining == 0 {
            (finish_actions())
        } @else {
            button hx-get=(names::QUIZ_ROUND_URL)
                   hx-target="main"
                   hx-swap="innerHTML" {
                "Next round"
            }
        }
    }
}

pub fn quiz_complete() -> Markup {
    html! {
        h1 { "Quiz complete" }
        p { "Every question for the chosen topics has been asked." }
        (finish_actions())
    }
}

fn finish_actions() -> Markup {
    html! {
        button hx-post=(names::QUIZ_RESET_URL)
               hx-target="main"
               hx-swap="innerHTML" {
            "Pick new topics"
        }
    }
}

/// Read-only listing of a topic selection, in store order.
pub fn question_list(questions: &[Question]) -> Markup {
    html! {
        h1 { "Questions" }
        @if questions.is_empty() {
            p { "None of the chosen topics has questions yet." }
        } @else {
            ol {
                @for question in questions {
                    li { (question.text()) }
                }
            }
        }
        button hx-get=(names::HOME_URL)
               hx-target="main"
               hx-swap="innerHTML" {
            "Back to topics"
        }
    }
}
