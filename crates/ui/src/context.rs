use std::sync::Arc;

use services::QuizLoopService;

pub trait UiApp: Send + Sync {
    /// Attribution tag the client was launched with, if any.
    fn source_tag(&self) -> Option<String>;

    fn quiz_loop(&self) -> Arc<QuizLoopService>;
}

#[derive(Clone)]
pub struct AppContext {
    source_tag: Option<String>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            source_tag: app.source_tag(),
            quiz_loop: app.quiz_loop(),
        }
    }

    #[must_use]
    pub fn source_tag(&self) -> Option<&str> {
        self.source_tag.as_deref()
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}

// Provided by the composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
