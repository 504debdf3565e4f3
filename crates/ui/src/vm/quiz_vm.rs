use quiz_core::model::OptionKey;
use services::{
    BootOutcome, Direction, QuizLoopService, QuizPhase, QuizSession, ResumeOffer, SessionError,
    SignInOutcome,
};
use tracing::warn;

use super::quiz_render::{Notice, QuestionCard, QuizRender, ResumePrompt};
use crate::views::ViewError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizIntent {
    Select(OptionKey),
    Next,
    Back,
    Restart,
    SignIn(String),
    SignOut,
    AcceptResume,
    DeclineResume,
    DismissSignup,
    DismissNotice,
    ResetProgress,
}

/// Screen state for one quiz: the live session plus whatever prompt is open.
///
/// `session` is `None` only while a resume offer found at startup is pending.
pub struct QuizVm {
    session: Option<QuizSession>,
    offer: Option<ResumeOffer>,
    signup_open: bool,
    notice: Option<Notice>,
}

impl QuizVm {
    #[must_use]
    pub fn ready(session: QuizSession, remote_unavailable: bool) -> Self {
        Self {
            session: Some(session),
            offer: None,
            signup_open: false,
            notice: remote_unavailable.then_some(Notice::RemoteUnavailable),
        }
    }

    #[must_use]
    pub fn offered(offer: ResumeOffer) -> Self {
        Self {
            session: None,
            offer: Some(offer),
            signup_open: false,
            notice: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn render(&self) -> QuizRender {
        let resume = self.offer.as_ref().map(|offer| ResumePrompt {
            identity: offer.identity.as_str().to_string(),
            answered: offer.answered(),
            total: offer.remote.question_order.len(),
        });
        let Some(session) = self.session.as_ref() else {
            return QuizRender {
                phase: if resume.is_some() {
                    QuizPhase::Reconciling
                } else {
                    QuizPhase::Loading
                },
                resume,
                notice: self.notice,
                ..QuizRender::loading()
            };
        };

        let current = session.current();
        let phase = if resume.is_some() {
            QuizPhase::Reconciling
        } else {
            session.phase()
        };
        QuizRender {
            phase,
            progress: Some(session.progress()),
            card: QuestionCard::from_current(current),
            results: session.is_complete().then(|| session.results()),
            resume,
            identity: session.identity().map(|id| id.as_str().to_string()),
            signup_prompt: self.signup_open,
            donation_prompt: session.donation_prompt_visible(),
            notice: self.notice,
            can_back: session.current_index() > 0,
            can_next: current.can_skip(),
        }
    }

    /// Apply one user intent, persisting through `quiz_loop` as needed.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Offline` when an answer cannot be checked,
    /// `ViewError::InvalidEmail` for a blank sign-in, and
    /// `ViewError::ProgressUnavailable` when saved progress cannot be read or
    /// erased. The quiz state is unchanged on error.
    pub async fn dispatch(
        &mut self,
        quiz_loop: &QuizLoopService,
        intent: QuizIntent,
    ) -> Result<(), ViewError> {
        match intent {
            QuizIntent::DismissSignup => {
                self.signup_open = false;
                Ok(())
            }
            QuizIntent::DismissNotice => {
                self.notice = None;
                Ok(())
            }
            QuizIntent::AcceptResume => {
                if let Some(offer) = self.offer.take() {
                    let boot = quiz_loop.accept_resume(offer).await;
                    self.session = Some(boot.session);
                    self.notice = None;
                }
                Ok(())
            }
            QuizIntent::DeclineResume => {
                if let Some(offer) = self.offer.take() {
                    let (boot, save) = quiz_loop.decline_resume(offer, self.session.take()).await;
                    self.session = Some(boot.session);
                    self.notice = Notice::for_save(&save);
                }
                Ok(())
            }
            // Everything else waits until a pending offer is settled.
            _ if self.offer.is_some() => Ok(()),
            other => self.apply(quiz_loop, other).await,
        }
    }

    async fn apply(
        &mut self,
        quiz_loop: &QuizLoopService,
        intent: QuizIntent,
    ) -> Result<(), ViewError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        match intent {
            QuizIntent::Select(choice) => match quiz_loop.submit_answer(session, choice).await {
                Ok(outcome) => {
                    if outcome.prompts.signup {
                        self.signup_open = true;
                    }
                    self.notice = Notice::for_save(&outcome.save);
                    Ok(())
                }
                Err(SessionError::AlreadyAnswered | SessionError::Completed) => Ok(()),
                Err(err) => {
                    warn!(error = %err, "answer check failed");
                    Err(ViewError::Offline)
                }
            },
            QuizIntent::Next => {
                if session.current().can_skip() {
                    self.advance(quiz_loop, Direction::Next).await;
                }
                Ok(())
            }
            QuizIntent::Back => {
                if session.current_index() > 0 {
                    self.advance(quiz_loop, Direction::Back).await;
                }
                Ok(())
            }
            QuizIntent::Restart => {
                let save = quiz_loop.restart(session).await;
                self.notice = Notice::for_save(&save);
                Ok(())
            }
            QuizIntent::SignIn(email) => match quiz_loop.sign_in(session, &email).await {
                Ok(SignInOutcome::OfferResume(offer)) => {
                    self.signup_open = false;
                    self.offer = Some(offer);
                    Ok(())
                }
                Ok(SignInOutcome::NoSavedProgress(save)) => {
                    self.signup_open = false;
                    self.notice = Notice::for_save(&save).or(Some(Notice::NoSavedProgress));
                    Ok(())
                }
                Err(SessionError::Identity(_)) => Err(ViewError::InvalidEmail),
                Err(err) => {
                    warn!(error = %err, "sign-in lookup failed");
                    Err(ViewError::ProgressUnavailable)
                }
            },
            QuizIntent::SignOut => {
                quiz_loop.sign_out(session).await;
                self.notice = Some(Notice::SignedOut);
                Ok(())
            }
            QuizIntent::ResetProgress => match quiz_loop.reset_progress(session).await {
                Ok(()) => {
                    self.notice = Some(Notice::ProgressReset);
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "progress reset failed");
                    Err(ViewError::ProgressUnavailable)
                }
            },
            QuizIntent::AcceptResume
            | QuizIntent::DeclineResume
            | QuizIntent::DismissSignup
            | QuizIntent::DismissNotice => Ok(()),
        }
    }

    async fn advance(&mut self, quiz_loop: &QuizLoopService, direction: Direction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !quiz_loop.advance(session, direction).await {
            self.notice = Some(Notice::LocalSaveFailed);
        }
    }
}

/// Boot the quiz: fetch the catalog and reconcile saved progress.
///
/// # Errors
///
/// Returns `ViewError::Offline` when the catalog cannot be fetched.
pub async fn start_quiz(
    quiz_loop: &QuizLoopService,
    source_tag: Option<&str>,
) -> Result<QuizVm, ViewError> {
    match quiz_loop.boot(source_tag).await {
        Ok(BootOutcome::Ready(boot)) => Ok(QuizVm::ready(boot.session, boot.remote_unavailable)),
        Ok(BootOutcome::OfferResume(offer)) => Ok(QuizVm::offered(offer)),
        Err(err) => {
            warn!(error = %err, "quiz boot failed");
            Err(ViewError::Offline)
        }
    }
}
