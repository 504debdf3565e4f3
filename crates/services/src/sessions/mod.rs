mod order;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{PerformanceTier, QuizProgress, QuizResults, TopicBreakdown};
pub use service::{
    AnswerOutcome, CurrentQuestion, DONATION_PROMPT_AT, Direction, PromptEvents, QuizPhase,
    QuizSession, SIGNUP_PROMPT_AT,
};
pub use workflow::{
    Boot, BootOutcome, QuizLoopService, ResumeOffer, SessionOrigin, SignInOutcome, SubmitOutcome,
};
