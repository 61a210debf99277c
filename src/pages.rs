//! HTML pages, rendered with [`maud`] (which escapes every interpolation).

use maud::{DOCTYPE, Markup, html};

use crate::paste_service::{PasteView, SearchHit};

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                header {
                    a href="/" { "stoopid-paste" }
                }
                main { (body) }
            }
        }
    }
}

fn search_form(query: &str) -> Markup {
    html! {
        form method="get" action="/search" {
            input type="search" name="q" value=(query) placeholder="Search pastes";
            button type="submit" { "Search" }
        }
    }
}

#[must_use]
pub fn index_page(pastes: &[PasteView]) -> Markup {
    layout(
        "stoopid-paste",
        html! {
            form method="post" action="/" {
                textarea name="content" rows="12" cols="80" required {}
                br;
                button type="submit" { "Create paste" }
            }
            (search_form(""))
            h2 { "Recent pastes" }
            @if pastes.is_empty() {
                p { "No pastes yet." }
            } @else {
                ul {
                    @for paste in pastes {
                        li.paste {
                            a href={ "/" (paste.id) } { (paste.id) }
                            " "
                            small { (paste.created_at) }
                            pre { (paste.content) }
                        }
                    }
                }
            }
        },
    )
}

#[must_use]
pub fn view_page(paste: &PasteView) -> Markup {
    layout(
        &paste.id,
        html! {
            h2 { (paste.id) }
            p {
                small { "Created " (paste.created_at) }
                " "
                a href={ "/" (paste.id) "/raw" } { "raw" }
            }
            pre { (paste.content) }
        },
    )
}

#[must_use]
pub fn search_page(query: &str, hits: &[SearchHit]) -> Markup {
    layout(
        "Search",
        html! {
            (search_form(query))
            @if !query.is_empty() {
                h2 { "Results for \u{201c}" (query) "\u{201d}" }
            }
            @if hits.is_empty() {
                p { "No results." }
            } @else {
                ul {
                    @for hit in hits {
                        li.result {
                            a href={ "/" (hit.id) } { (hit.id) }
                            @if let Some(snippet) = &hit.snippet {
                                pre { (snippet) }
                            }
                        }
                    }
                }
            }
        },
    )
}
