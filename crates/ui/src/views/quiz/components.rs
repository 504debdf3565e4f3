use dioxus::prelude::*;

use quiz_core::model::OptionKey;
use services::QuizResults;

use crate::vm::{OptionRow, OptionState, QuizIntent, ResumePrompt};

fn option_class(state: OptionState) -> &'static str {
    match state {
        OptionState::Open => "quiz-option",
        OptionState::Correct => "quiz-option quiz-option--correct",
        OptionState::Incorrect => "quiz-option quiz-option--incorrect",
        OptionState::Muted => "quiz-option quiz-option--muted",
    }
}

#[component]
pub(super) fn OptionButton(
    row: OptionRow,
    enabled: bool,
    on_intent: EventHandler<QuizIntent>,
) -> Element {
    let key = row.key;
    let class = option_class(row.state);
    rsx! {
        button {
            class: "{class}",
            id: "quiz-option-{key}",
            r#type: "button",
            disabled: !enabled,
            onclick: move |_| on_intent.call(QuizIntent::Select(key)),
            span { class: "quiz-option__key", "{key}" }
            span { class: "quiz-option__label", "{row.label}" }
        }
    }
}

#[component]
pub(super) fn ResultsPanel(results: QuizResults, on_intent: EventHandler<QuizIntent>) -> Element {
    rsx! {
        div { class: "quiz-results",
            h2 { class: "quiz-results__title", "Quiz complete" }
            p { class: "quiz-results__score",
                "You scored {results.score} out of {results.total} ({results.percentage}%)"
            }
            p { class: "quiz-results__message", "{results.tier.message()}" }
            if !results.topics.is_empty() {
                h3 { "By topic" }
                ul { class: "quiz-results__topics",
                    for topic in results.topics.iter() {
                        li { key: "{topic.topic}",
                            span { class: "quiz-results__topic", "{topic.topic}" }
                            span { class: "quiz-results__topic-score",
                                "{topic.correct}/{topic.total} ({topic.percentage}%)"
                            }
                        }
                    }
                }
            }
            button {
                class: "btn btn-primary",
                id: "quiz-restart",
                r#type: "button",
                onclick: move |_| on_intent.call(QuizIntent::Restart),
                "Restart Quiz"
            }
        }
    }
}

#[component]
pub(super) fn ResumeDialog(prompt: ResumePrompt, on_intent: EventHandler<QuizIntent>) -> Element {
    rsx! {
        div { class: "quiz-overlay",
            div {
                class: "quiz-modal",
                role: "dialog",
                aria_modal: "true",
                h2 { "Welcome back!" }
                p {
                    "{prompt.identity} has saved progress: {prompt.answered} of {prompt.total} questions answered."
                }
                div { class: "quiz-modal__actions",
                    button {
                        class: "btn btn-primary",
                        id: "quiz-resume-accept",
                        r#type: "button",
                        onclick: move |_| on_intent.call(QuizIntent::AcceptResume),
                        "Resume"
                    }
                    button {
                        class: "btn btn-secondary",
                        id: "quiz-resume-decline",
                        r#type: "button",
                        onclick: move |_| on_intent.call(QuizIntent::DeclineResume),
                        "Keep current progress"
                    }
                }
            }
        }
    }
}

#[component]
pub(super) fn EmailForm(
    submit_label: &'static str,
    busy: bool,
    on_intent: EventHandler<QuizIntent>,
) -> Element {
    let mut email = use_signal(String::new);
    rsx! {
        form {
            class: "quiz-email",
            onsubmit: move |evt: FormEvent| {
                evt.prevent_default();
                on_intent.call(QuizIntent::SignIn(email()));
            },
            input {
                class: "quiz-email__input",
                r#type: "email",
                placeholder: "you@example.com",
                value: "{email}",
                oninput: move |evt| email.set(evt.value()),
            }
            button {
                class: "btn btn-primary",
                r#type: "submit",
                disabled: busy,
                "{submit_label}"
            }
        }
    }
}

#[component]
pub(super) fn AccountPanel(
    identity: Option<String>,
    busy: bool,
    on_intent: EventHandler<QuizIntent>,
) -> Element {
    rsx! {
        section { class: "quiz-account",
            if let Some(identity) = identity {
                p { class: "quiz-account__who", "Progress saved for {identity}" }
                div { class: "quiz-account__actions",
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        disabled: busy,
                        onclick: move |_| on_intent.call(QuizIntent::SignOut),
                        "Sign out"
                    }
                    button {
                        class: "btn btn-danger",
                        id: "quiz-reset-progress",
                        r#type: "button",
                        disabled: busy,
                        onclick: move |_| on_intent.call(QuizIntent::ResetProgress),
                        "Erase saved progress"
                    }
                }
            } else {
                p { class: "quiz-account__who", "Save your progress across devices with your email." }
                EmailForm { submit_label: "Save progress", busy, on_intent }
            }
        }
    }
}

#[component]
pub(super) fn SignupPrompt(busy: bool, on_intent: EventHandler<QuizIntent>) -> Element {
    rsx! {
        div { class: "quiz-overlay",
            div {
                class: "quiz-modal quiz-modal--signup",
                role: "dialog",
                aria_modal: "true",
                h2 { "Nice progress!" }
                p { "Enter your email to keep your answers and pick up where you left off." }
                EmailForm { submit_label: "Save my progress", busy, on_intent }
                button {
                    class: "btn btn-link",
                    id: "quiz-signup-dismiss",
                    r#type: "button",
                    onclick: move |_| on_intent.call(QuizIntent::DismissSignup),
                    "Not now"
                }
            }
        }
    }
}

#[component]
pub(super) fn DonationBanner() -> Element {
    rsx! {
        aside { class: "quiz-donation",
            p { "Enjoying the quiz? A small donation keeps new questions coming." }
        }
    }
}

/// Keyboard shortcut for an option: `1`-`4` or the letter itself.
pub(super) fn option_for_key(value: &str) -> Option<OptionKey> {
    match value.to_ascii_uppercase().as_str() {
        "1" | "A" => Some(OptionKey::A),
        "2" | "B" => Some(OptionKey::B),
        "3" | "C" => Some(OptionKey::C),
        "4" | "D" => Some(OptionKey::D),
        _ => None,
    }
}
