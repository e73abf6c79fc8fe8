use maud::{html, Markup};

use crate::{models::Topic, names};

pub fn topic_picker(topics: &[Topic]) -> Markup {
    html! {
        h1 { "Pick your topics" }
        @if topics.is_empty() {
            p { "There are no topics yet. Import a question bank to get started." }
        } @else {
            form hx-post=(names::QUIZ_SETUP_URL)
                 hx-target="main"
                 hx-swap="innerHTML" {
                fieldset {
                    @for topic in topics {
                        label {
                            input type="checkbox" name=(topic.name) value="on";
                            (topic.name)
                        }
                    }
                }
                input type="submit" value="Start quiz";
                button type="button"
                       hx-get=(names::QUIZ_QUESTIONS_URL)
                       hx-include="closest form"
                       hx-target="main"
                       hx-swap="innerHTML" {
                    "List questions"
                }
            }
        }
    }
}
