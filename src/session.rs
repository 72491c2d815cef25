//! Interactive try-on session: inputs, current image, and request state.

use tracing::{debug, info};

use crate::error::TryOnError;
use crate::normalize::NormalizedResult;
use crate::orchestrator::{GenerationRequest, Orchestrator, RefinementRequest};
use crate::ports::ImagePayload;
use crate::prompt::{Refinement, STYLING_INSTRUCTION};

/// Where a session is in its request lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing generated yet.
    #[default]
    Idle,
    /// A try-on request is in flight.
    Generating,
    /// A refinement of `source` is in flight.
    Refining {
        /// Image being refined.
        source: ImagePayload,
    },
    /// The last request produced an image.
    Success {
        /// The current image.
        image: ImagePayload,
        /// Text the model sent alongside the image.
        note: Option<String>,
    },
    /// The last request failed.
    Failed {
        /// User-facing failure reason.
        reason: String,
        /// Last good image, kept when a refinement fails.
        previous: Option<ImagePayload>,
    },
}

impl SessionState {
    /// Whether a request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Refining { .. })
    }

    /// The image a refinement would start from, if any.
    #[must_use]
    pub fn current_image(&self) -> Option<&ImagePayload> {
        match self {
            Self::Success { image, .. } => Some(image),
            Self::Failed { previous, .. } => previous.as_ref(),
            Self::Refining { source } => Some(source),
            Self::Idle | Self::Generating => None,
        }
    }

    /// Transition into `Generating`. Any current image is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::Busy`] if a request is already in flight.
    pub fn begin_generation(&self) -> Result<Self, TryOnError> {
        if self.is_busy() {
            return Err(TryOnError::Busy);
        }
        Ok(Self::Generating)
    }

    /// Transition into `Refining` from the current image.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::Busy`] if a request is already in flight, or
    /// [`TryOnError::NothingToRefine`] if there is no image yet.
    pub fn begin_refinement(&self) -> Result<Self, TryOnError> {
        self.refinement_source().map(|source| Self::Refining { source })
    }

    fn refinement_source(&self) -> Result<ImagePayload, TryOnError> {
        if self.is_busy() {
            return Err(TryOnError::Busy);
        }
        self.current_image().cloned().ok_or(TryOnError::NothingToRefine)
    }

    /// Transition out of an in-flight state with the call's outcome.
    ///
    /// A result without an image becomes `Failed` carrying
    /// [`TryOnError::EmptyResult`]. Calling this on an idle state is a
    /// no-op that returns the state unchanged.
    #[must_use]
    pub fn complete(self, outcome: Result<NormalizedResult, &TryOnError>) -> Self {
        let previous = match self {
            Self::Generating => None,
            Self::Refining { source } => Some(source),
            other => return other,
        };
        match outcome {
            Ok(NormalizedResult { image: Some(image), text }) => Self::Success { image, note: text },
            Ok(NormalizedResult { image: None, text }) => {
                Self::Failed { reason: TryOnError::EmptyResult { text }.to_string(), previous }
            }
            Err(e) => Self::Failed { reason: e.to_string(), previous },
        }
    }
}

/// Holds the user's inputs and the current result, and drives requests.
///
/// Operations take `&mut self`, so at most one request is in flight.
///
/// There is no cancellation. Dropping a `generate` or `refine` future before
/// it completes leaves the session `Generating` or `Refining`, and every
/// later call returns [`TryOnError::Busy`]; start a new session instead.
pub struct Session<'a> {
    orchestrator: Orchestrator<'a>,
    user_image: Option<ImagePayload>,
    outfit_image: Option<ImagePayload>,
    styling_instruction: String,
    state: SessionState,
}

impl<'a> Session<'a> {
    /// Start an empty session.
    #[must_use]
    pub fn new(orchestrator: Orchestrator<'a>) -> Self {
        Self {
            orchestrator,
            user_image: None,
            outfit_image: None,
            styling_instruction: STYLING_INSTRUCTION.to_string(),
            state: SessionState::Idle,
        }
    }

    /// Start a session from an image generated earlier.
    #[must_use]
    pub fn with_generated(orchestrator: Orchestrator<'a>, image: ImagePayload) -> Self {
        let mut session = Self::new(orchestrator);
        session.state = SessionState::Success { image, note: None };
        session
    }

    /// Replace the styling instruction used by [`Session::generate`].
    #[must_use]
    pub fn with_styling_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.styling_instruction = instruction.into();
        self
    }

    /// Set or clear the user's photo.
    pub fn set_user_image(&mut self, image: Option<ImagePayload>) {
        self.user_image = image;
    }

    /// Set or clear the outfit photo.
    pub fn set_outfit_image(&mut self, image: Option<ImagePayload>) {
        self.outfit_image = image;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Generate the try-on image from the user and outfit photos.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::InputPrecondition`] if either photo is missing,
    /// [`TryOnError::EmptyResult`] if no image came back, or the
    /// orchestrator's error.
    pub async fn generate(&mut self) -> Result<&SessionState, TryOnError> {
        let (Some(user_image), Some(outfit_image)) = (&self.user_image, &self.outfit_image) else {
            return Err(TryOnError::InputPrecondition(
                "upload both a selfie and an outfit image".into(),
            ));
        };
        let request = GenerationRequest {
            user_image: user_image.clone(),
            outfit_image: outfit_image.clone(),
            instruction: self.styling_instruction.clone(),
        };

        let next = self.state.begin_generation()?;
        self.transition(next);
        info!(model = self.orchestrator.model(), "styling your look");
        let outcome = self.orchestrator.generate(&request).await;
        self.finish(outcome)
    }

    /// Apply a refinement to the current image.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::InputPrecondition`] for blank edit text,
    /// [`TryOnError::NothingToRefine`] without a current image,
    /// [`TryOnError::EmptyResult`] if no image came back, or the
    /// orchestrator's error.
    pub async fn refine(&mut self, refinement: &Refinement) -> Result<&SessionState, TryOnError> {
        if let Refinement::Edit(text) = refinement {
            if text.trim().is_empty() {
                return Err(TryOnError::InputPrecondition("edit text is empty".into()));
            }
        }

        let source = self.state.refinement_source()?;
        let request = RefinementRequest {
            source_image: source.clone(),
            instruction: refinement.instruction(),
        };

        self.transition(SessionState::Refining { source });
        info!(refinement = %refinement.label(), "refining image");
        let outcome = self.orchestrator.refine(&request).await;
        self.finish(outcome)
    }

    fn finish(
        &mut self,
        outcome: Result<NormalizedResult, TryOnError>,
    ) -> Result<&SessionState, TryOnError> {
        let state = std::mem::take(&mut self.state);
        match outcome {
            Ok(result) => {
                let missing_image = result.image.is_none().then(|| result.text.clone());
                self.transition(state.complete(Ok(result)));
                match missing_image {
                    Some(text) => Err(TryOnError::EmptyResult { text }),
                    None => Ok(&self.state),
                }
            }
            Err(e) => {
                self.transition(state.complete(Err(&e)));
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        match &next {
            SessionState::Failed { reason, .. } => debug!(%reason, "session state: failed"),
            other => debug!(state = state_name(other), "session state"),
        }
        self.state = next;
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Generating => "generating",
        SessionState::Refining { .. } => "refining",
        SessionState::Success { .. } => "success",
        SessionState::Failed { .. } => "failed",
    }
}
