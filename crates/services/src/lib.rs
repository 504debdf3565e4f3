#![forbid(unsafe_code)]

pub mod app_services;
pub mod bridge;
pub mod catalog_service;
pub mod error;
pub mod http_backend;
pub mod progress_service;
pub mod remote;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::ClientServices;
pub use bridge::{ProgressBridge, RemoteSave, SaveReport};
pub use catalog_service::CatalogService;
pub use error::{AppServicesError, BackendError, CatalogError, ProgressError, SessionError};
pub use http_backend::{HttpBackendConfig, HttpQuizBackend};
pub use progress_service::ProgressService;
pub use remote::{ProgressRemote, QuizBackend};

pub use sessions::{
    Boot, BootOutcome, CurrentQuestion, Direction, PerformanceTier, QuizLoopService, QuizPhase,
    QuizProgress, QuizResults, QuizSession, ResumeOffer, SessionOrigin, SignInOutcome,
    SubmitOutcome, TopicBreakdown,
};
