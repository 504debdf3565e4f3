use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use quiz_core::Clock;
use quiz_core::model::{CatalogEntry, OptionKey, QuestionId};
use quiz_core::time::fixed_now;
use services::{CatalogService, ProgressBridge, ProgressService, QuizBackend, QuizLoopService};
use storage::repository::InMemoryRepository;

use crate::context::{UiApp, build_app_context};
use crate::views::QuizView;
use crate::views::quiz::QuizTestHandles;
use crate::vm::QuizIntent;

#[derive(Clone)]
struct TestApp {
    source_tag: Option<String>,
    quiz_loop: Arc<QuizLoopService>,
}

impl UiApp for TestApp {
    fn source_tag(&self) -> Option<String> {
        self.source_tag.clone()
    }

    fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    handles: QuizTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.handles.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    rsx! { QuizView {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub quiz_loop: Arc<QuizLoopService>,
    pub handles: QuizTestHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Drive until `done` holds for the rendered HTML, or give up after a few rounds.
    pub async fn drive_until(&mut self, done: impl Fn(&str) -> bool) -> String {
        for _ in 0..20 {
            let html = self.render();
            if done(&html) {
                return html;
            }
            self.drive_async().await;
        }
        self.render()
    }

    pub fn dispatch(&self, intent: QuizIntent) {
        let dispatch = self.handles.dispatch();
        self.dom.in_runtime(|| dispatch.call(intent));
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// `Q1..=Qn`, every correct key `A`.
pub fn catalog(n: usize) -> Arc<CatalogService> {
    let entries = (1..=n)
        .map(|i| CatalogEntry {
            id: QuestionId::new(format!("Q{i}")),
            text: format!("Question number {i}"),
            options: OptionKey::ALL
                .into_iter()
                .map(|key| (key, format!("Answer {key} for {i}")))
                .collect(),
            correct_answer: OptionKey::A,
            topic: "Regularization".to_string(),
        })
        .collect();
    Arc::new(CatalogService::new(entries))
}

pub fn remote_store() -> Arc<ProgressService> {
    Arc::new(ProgressService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    ))
}

pub fn setup_quiz_harness(
    backend: Arc<dyn QuizBackend>,
    remote: Arc<ProgressService>,
) -> ViewHarness {
    let bridge = ProgressBridge::new(Arc::new(InMemoryRepository::new()), remote);
    let quiz_loop = Arc::new(QuizLoopService::new(backend, bridge));
    setup_with_quiz_loop(quiz_loop)
}

pub fn setup_with_quiz_loop(quiz_loop: Arc<QuizLoopService>) -> ViewHarness {
    let handles = QuizTestHandles::default();
    let app = Arc::new(TestApp {
        source_tag: Some("newsletter".to_string()),
        quiz_loop: Arc::clone(&quiz_loop),
    });

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            handles: handles.clone(),
        },
    );

    ViewHarness {
        dom,
        quiz_loop,
        handles,
    }
}
