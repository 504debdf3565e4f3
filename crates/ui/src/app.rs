use dioxus::prelude::*;
use dioxus_router::Router;

use crate::routes::Route;

#[component]
fn FatalError(details: String) -> Element {
    rsx! {
        div { class: "fatal",
            h1 { "The quiz hit an unexpected error" }
            p { "Restart the app to continue. Your answers are kept on this device." }
            pre { "{details}" }
        }
    }
}

/// Root component: global stylesheet, window title and the router.
#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }
        document::Title { "ML Quiz" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    FatalError { details: format!("{errors:?}") }
                },
                Router::<Route> {}
            }
        }
    }
}
