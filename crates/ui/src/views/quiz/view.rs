use dioxus::prelude::*;

use services::QuizPhase;

use super::components::{
    AccountPanel, DonationBanner, OptionButton, ResultsPanel, ResumeDialog, SignupPrompt,
    option_for_key,
};
use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{QuizIntent, QuizRender, QuizVm, start_quiz};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

#[component]
pub fn QuizView() -> Element {
    let ctx = use_context::<AppContext>();
    let quiz_loop = ctx.quiz_loop();
    let source_tag = ctx.source_tag().map(str::to_string);

    let error = use_signal(|| None::<ViewError>);
    let vm = use_signal(|| None::<QuizVm>);
    let render = use_signal(QuizRender::loading);
    let busy = use_signal(|| false);
    let last_intent = use_signal(|| None::<QuizIntent>);

    let quiz_loop_for_resource = quiz_loop.clone();
    let resource = use_resource(move || {
        let quiz_loop = quiz_loop_for_resource.clone();
        let source_tag = source_tag.clone();
        let mut error = error;
        let mut vm = vm;
        let mut render = render;
        let mut last_intent = last_intent;

        async move {
            last_intent.set(None);
            let started = start_quiz(&quiz_loop, source_tag.as_deref()).await?;
            render.set(started.render());
            vm.set(Some(started));
            error.set(None);
            Ok::<_, ViewError>(())
        }
    });
    let state = view_state_from_resource(&resource);

    let dispatch_intent = {
        let quiz_loop = quiz_loop.clone();
        use_callback(move |intent: QuizIntent| {
            let quiz_loop = quiz_loop.clone();
            let mut error = error;
            let mut vm = vm;
            let mut render = render;
            let mut busy = busy;
            let mut last_intent = last_intent;

            if busy() {
                return;
            }
            busy.set(true);
            spawn(async move {
                last_intent.set(Some(intent.clone()));
                let taken = vm.write().take();
                let Some(mut vm_value) = taken else {
                    busy.set(false);
                    error.set(Some(ViewError::Unknown));
                    return;
                };

                let result = vm_value.dispatch(&quiz_loop, intent).await;
                render.set(vm_value.render());

                // Always put the quiz back so the UI remains usable after errors.
                vm.set(Some(vm_value));
                busy.set(false);

                match result {
                    Ok(()) => {
                        last_intent.set(None);
                        error.set(None);
                    }
                    Err(err) => error.set(Some(err)),
                }
            });
        })
    };

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<QuizTestHandles>() {
                handles.register(dispatch_intent, render);
            }
        }
    }

    let retry_action = use_callback(move |()| match last_intent() {
        Some(intent) => dispatch_intent.call(intent),
        None => {
            let mut resource = resource;
            resource.restart();
        }
    });

    let on_key = use_callback(move |evt: KeyboardEvent| {
        let model = render.read();
        if model.resume.is_some() || model.signup_prompt {
            return;
        }
        match evt.data.key() {
            Key::ArrowRight if model.can_next => {
                evt.prevent_default();
                dispatch_intent.call(QuizIntent::Next);
            }
            Key::ArrowLeft if model.can_back => {
                evt.prevent_default();
                dispatch_intent.call(QuizIntent::Back);
            }
            Key::Character(value) => {
                let answerable = model.card.as_ref().is_some_and(|card| card.is_answerable());
                if let (true, Some(choice)) = (answerable, option_for_key(&value)) {
                    evt.prevent_default();
                    dispatch_intent.call(QuizIntent::Select(choice));
                }
            }
            _ => {}
        }
    });

    let model = render.read().clone();
    let is_busy = busy();
    let progress_label = model.progress_label();
    let score_label = model.score_label();
    let percent_complete = model.progress.map_or(0, |progress| progress.percent_complete);

    rsx! {
        div { class: "page quiz-page", id: "quiz-root", tabindex: "0", onkeydown: on_key,
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { class: "quiz-loading", "Loading questions..." }
                },
                ViewState::Error(err) => rsx! {
                    div { class: "quiz-error",
                        p { "{err.message()}" }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| retry_action.call(()),
                            "Retry"
                        }
                    }
                },
                ViewState::Ready(()) => rsx! {
                    if let Some(err) = *error.read() {
                        div { class: "quiz-error",
                            p { "{err.message()}" }
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| retry_action.call(()),
                                "Retry"
                            }
                        }
                    }
                    if let Some(notice) = model.notice {
                        div { class: "quiz-notice",
                            p { "{notice.message()}" }
                            button {
                                class: "btn btn-link",
                                r#type: "button",
                                onclick: move |_| dispatch_intent.call(QuizIntent::DismissNotice),
                                "Dismiss"
                            }
                        }
                    }
                    if let Some(prompt) = model.resume.clone() {
                        ResumeDialog { prompt, on_intent: dispatch_intent }
                    }
                    if model.signup_prompt {
                        SignupPrompt { busy: is_busy, on_intent: dispatch_intent }
                    }
                    if model.donation_prompt {
                        DonationBanner {}
                    }
                    if model.phase == QuizPhase::Complete {
                        if let Some(results) = model.results.clone() {
                            ResultsPanel { results, on_intent: dispatch_intent }
                        }
                    } else if let Some(card) = model.card.clone() {
                        div { class: "quiz-progress",
                            span { class: "quiz-progress__label", "{progress_label}" }
                            span { class: "quiz-progress__score", "{score_label}" }
                            div { class: "quiz-progress__bar",
                                div {
                                    class: "quiz-progress__fill",
                                    style: "width: {percent_complete}%",
                                }
                            }
                        }
                        article { class: "quiz-card",
                            p { class: "quiz-card__topic", "{card.topic}" }
                            h2 { class: "quiz-card__text", "{card.text}" }
                            div { class: "quiz-card__options",
                                for row in card.options.iter().cloned() {
                                    OptionButton {
                                        key: "{row.key}",
                                        row,
                                        enabled: card.is_answerable() && !is_busy,
                                        on_intent: dispatch_intent,
                                    }
                                }
                            }
                            if let Some(feedback) = card.feedback() {
                                p { class: "quiz-card__feedback", "{feedback}" }
                            }
                            if let Some(search_url) = card.search_url() {
                                p { class: "quiz-card__search",
                                    "Want to dig deeper? "
                                    a {
                                        id: "quiz-search-link",
                                        href: "{search_url}",
                                        target: "_blank",
                                        rel: "noopener noreferrer",
                                        "Search this topic"
                                    }
                                }
                            }
                        }
                        footer { class: "quiz-nav",
                            button {
                                class: "btn btn-secondary",
                                id: "quiz-back",
                                r#type: "button",
                                disabled: !model.can_back || is_busy,
                                onclick: move |_| dispatch_intent.call(QuizIntent::Back),
                                "Back"
                            }
                            button {
                                class: "btn btn-primary",
                                id: "quiz-next",
                                r#type: "button",
                                disabled: !model.can_next || is_busy,
                                onclick: move |_| dispatch_intent.call(QuizIntent::Next),
                                "Next"
                            }
                        }
                    }
                    if model.resume.is_none() && model.progress.is_some() {
                        AccountPanel {
                            identity: model.identity.clone(),
                            busy: is_busy,
                            on_intent: dispatch_intent,
                        }
                    }
                },
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct QuizTestHandles {
    dispatch: Rc<RefCell<Option<Callback<QuizIntent>>>>,
    render: Rc<RefCell<Option<Signal<QuizRender>>>>,
}

#[cfg(test)]
impl QuizTestHandles {
    pub(crate) fn register(&self, dispatch: Callback<QuizIntent>, render: Signal<QuizRender>) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.render.borrow_mut() = Some(render);
    }

    pub(crate) fn dispatch(&self) -> Callback<QuizIntent> {
        (*self.dispatch.borrow()).expect("quiz dispatch registered")
    }

    pub(crate) fn render(&self) -> QuizRender {
        let signal = (*self.render.borrow()).expect("quiz render registered");
        signal.read().clone()
    }
}
