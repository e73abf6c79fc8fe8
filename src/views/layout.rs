use maud::{html, Markup, DOCTYPE};

use crate::{names, utils};

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

fn css() -> Markup {
    html! {
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        script src=(HTMX_SRC) {}
    }
}

fn header() -> Markup {
    html! {
        header {
            nav {
                a href=(names::HOME_URL) { strong { "Topic Quiz" } }
                span."version" { (utils::VERSION) }
            }
        }
    }
}

pub fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="color-scheme" content="light dark";

            (css())
            (js())

            title { (format!("{title} - Topic Quiz")) }
        }

        body."container" {
            (header())
            main { (body) }
        }
    }
}

/// Fragment for htmx swaps into `main`; the `title` tag updates the tab.
pub fn titled(title: &str, body: Markup) -> Markup {
    html! {
        title { (title) " - Topic Quiz" }
        (body)
    }
}

/// Full page for a plain navigation, fragment for an htmx request.
pub fn render(is_htmx: bool, title: &str, body: Markup) -> Markup {
    if is_htmx {
        titled(title, body)
    } else {
        page(title, body)
    }
}
