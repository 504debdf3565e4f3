use std::sync::Arc;

use quiz_core::model::{AnswerRecord, Identity, OptionKey, Question, SessionSnapshot};
use tracing::{info, warn};

use super::service::{Direction, PromptEvents, QuizSession};
use crate::bridge::{ProgressBridge, RemoteSave, SaveReport};
use crate::error::SessionError;
use crate::remote::QuizBackend;

/// Where a booted session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Fresh,
    LocalCache,
    Remote,
}

/// A session ready to play.
#[derive(Debug, Clone)]
pub struct Boot {
    pub session: QuizSession,
    pub origin: SessionOrigin,
    /// The remote store could not be reached; local state was used instead.
    pub remote_unavailable: bool,
}

/// Saved remote progress the user may resume or discard.
#[derive(Debug, Clone)]
pub struct ResumeOffer {
    pub identity: Identity,
    pub remote: SessionSnapshot,
    pub catalog: Arc<[Question]>,
    /// The session this offer interrupts already showed the signup prompt.
    pub signup_prompted: bool,
}

impl ResumeOffer {
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.remote.answered
    }
}

#[derive(Debug, Clone)]
pub enum BootOutcome {
    Ready(Boot),
    OfferResume(ResumeOffer),
}

#[derive(Debug, Clone)]
pub enum SignInOutcome {
    OfferResume(ResumeOffer),
    /// Nothing stored for this identity; the current session was saved under it.
    NoSavedProgress(SaveReport),
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub record: AnswerRecord,
    pub prompts: PromptEvents,
    pub save: SaveReport,
}

/// Orchestrates session start, answering and persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    backend: Arc<dyn QuizBackend>,
    bridge: ProgressBridge,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>, bridge: ProgressBridge) -> Self {
        Self { backend, bridge }
    }

    #[must_use]
    pub fn bridge(&self) -> &ProgressBridge {
        &self.bridge
    }

    /// Load the catalog and decide what to show first.
    ///
    /// A remembered identity with remote progress yields an offer; otherwise
    /// the local cache is resumed, or a fresh session is started.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the catalog cannot be fetched.
    pub async fn boot(&self, inbound_source_tag: Option<&str>) -> Result<BootOutcome, SessionError> {
        self.bridge.capture_source_tag(inbound_source_tag).await;
        let catalog: Arc<[Question]> = self.backend.list_questions().await?.into();
        let identity = self.bridge.stored_identity().await;

        let mut remote_unavailable = false;
        if let Some(identity) = &identity {
            match self.bridge.load_remote(identity).await {
                Ok(Some(remote)) => {
                    return Ok(BootOutcome::OfferResume(ResumeOffer {
                        identity: identity.clone(),
                        remote,
                        catalog,
                        signup_prompted: false,
                    }));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(operation = "load_progress", error = %err, "falling back to local progress");
                    remote_unavailable = true;
                }
            }
        }

        let (mut session, origin) = self.local_or_fresh(catalog).await;
        if let Some(identity) = identity {
            session.bind_identity(identity);
        }
        info!(?origin, questions = session.order().len(), "quiz ready");
        Ok(BootOutcome::Ready(Boot {
            session,
            origin,
            remote_unavailable,
        }))
    }

    /// Continue from the offered remote snapshot. The signup latch of the
    /// interrupted session carries over.
    pub async fn accept_resume(&self, offer: ResumeOffer) -> Boot {
        let mut session = QuizSession::resume(&offer.remote, offer.catalog);
        if offer.signup_prompted {
            session.mark_signup_prompted();
        }
        session.bind_identity(offer.identity);
        self.bridge.save_local(&session.snapshot()).await;
        Boot {
            session,
            origin: SessionOrigin::Remote,
            remote_unavailable: false,
        }
    }

    /// Discard the offered snapshot.
    ///
    /// With `current` (sign-in) that session is kept; without it (startup) the
    /// local cache or a fresh session is used. Either way the kept session is
    /// saved under the offer's identity, replacing the remote copy.
    pub async fn decline_resume(
        &self,
        offer: ResumeOffer,
        current: Option<QuizSession>,
    ) -> (Boot, SaveReport) {
        let (mut session, origin) = match current {
            Some(session) => (session, SessionOrigin::LocalCache),
            None => self.local_or_fresh(offer.catalog).await,
        };
        session.bind_identity(offer.identity);
        let save = self
            .bridge
            .save(session.identity(), &session.snapshot())
            .await;
        (
            Boot {
                session,
                origin,
                remote_unavailable: false,
            },
            save,
        )
    }

    /// Bind an email to the session, looking up saved progress first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Identity` for a blank email and
    /// `SessionError::Progress` when the lookup fails; the session is left
    /// unbound in both cases.
    pub async fn sign_in(
        &self,
        session: &mut QuizSession,
        email: &str,
    ) -> Result<SignInOutcome, SessionError> {
        let identity = Identity::parse(email)?;
        let remote = self.bridge.load_remote(&identity).await?;
        self.bridge.remember_identity(&identity).await;
        session.bind_identity(identity.clone());

        match remote {
            Some(remote) => Ok(SignInOutcome::OfferResume(ResumeOffer {
                identity,
                remote,
                catalog: session.catalog(),
                signup_prompted: session.signup_prompt_fired(),
            })),
            None => {
                let save = self.bridge.save(Some(&identity), &session.snapshot()).await;
                Ok(SignInOutcome::NoSavedProgress(save))
            }
        }
    }

    /// Unbind the identity; progress stays in the local cache.
    pub async fn sign_out(&self, session: &mut QuizSession) -> Option<Identity> {
        self.bridge.forget_identity().await;
        session.unbind_identity()
    }

    /// Check and record an answer for the current question, then persist.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` or `SessionError::AlreadyAnswered`
    /// before any backend call, and `SessionError::Backend` if checking fails.
    /// The session is unchanged on error.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        choice: OptionKey,
    ) -> Result<SubmitOutcome, SessionError> {
        let question_id = session.ensure_answerable()?.id.clone();
        let check = self.backend.check_answer(&question_id, choice).await?;
        let outcome = session.record_answer(choice, &check)?;
        let save = self
            .bridge
            .save(session.identity(), &outcome.snapshot)
            .await;

        Ok(SubmitOutcome {
            record: outcome.record,
            prompts: outcome.prompts,
            save,
        })
    }

    /// Move the cursor and cache the new position locally.
    pub async fn advance(&self, session: &mut QuizSession, direction: Direction) -> bool {
        session.advance(direction);
        self.bridge.save_local(&session.snapshot()).await
    }

    /// Reshuffle and start over. Remote progress for a bound identity is
    /// deleted; a failed delete is reported, not fatal.
    pub async fn restart(&self, session: &mut QuizSession) -> SaveReport {
        {
            let mut rng = rand::rng();
            session.restart(&mut rng);
        }

        let remote = match session.identity() {
            None => RemoteSave::Skipped,
            Some(identity) => match self.bridge.delete_remote(identity).await {
                Ok(()) => RemoteSave::Saved,
                Err(err) => {
                    warn!(operation = "reset_progress", error = %err, "remote delete on restart failed");
                    RemoteSave::Failed(err.to_string())
                }
            },
        };
        let local_saved = self.bridge.save_local(&session.snapshot()).await;
        SaveReport {
            local_saved,
            remote,
        }
    }

    /// Erase saved progress everywhere, then restart in memory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` if the remote delete fails; local
    /// cache and session are then left as they were.
    pub async fn reset_progress(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        self.bridge.reset(session.identity()).await?;
        let mut rng = rand::rng();
        session.restart(&mut rng);
        Ok(())
    }

    async fn local_or_fresh(&self, catalog: Arc<[Question]>) -> (QuizSession, SessionOrigin) {
        if let Some(snapshot) = self.bridge.load_local().await {
            return (
                QuizSession::resume(&snapshot, catalog),
                SessionOrigin::LocalCache,
            );
        }
        let session = {
            let mut rng = rand::rng();
            QuizSession::start(catalog, &mut rng)
        };
        self.bridge.save_local(&session.snapshot()).await;
        (session, SessionOrigin::Fresh)
    }
}
