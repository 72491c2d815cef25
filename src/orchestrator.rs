//! Builds capability requests for try-on generation and refinement.

use tracing::debug;

use crate::error::TryOnError;
use crate::mime::{self, MimeSniffer, SignatureSniffer};
use crate::normalize::{normalize, NormalizedResult};
use crate::ports::{Capability, CapabilityRequest, ImagePayload, Modality, Part};

/// Inputs for the initial try-on.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Photo of the person.
    pub user_image: ImagePayload,
    /// Photo of the outfit.
    pub outfit_image: ImagePayload,
    /// Styling instruction.
    pub instruction: String,
}

/// Inputs for refining a previously generated image.
#[derive(Debug, Clone)]
pub struct RefinementRequest {
    /// The image to refine, always a prior generation output.
    pub source_image: ImagePayload,
    /// Edit instruction.
    pub instruction: String,
}

/// Issues one capability call per operation and normalizes the reply.
pub struct Orchestrator<'a> {
    capability: &'a dyn Capability,
    model: String,
    sniffer: Box<dyn MimeSniffer>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator using the signature-based MIME sniffer.
    pub fn new(capability: &'a dyn Capability, model: impl Into<String>) -> Self {
        Self { capability, model: model.into(), sniffer: Box::new(SignatureSniffer) }
    }

    /// Replace the MIME sniffer used for generation inputs.
    #[must_use]
    pub fn with_sniffer(mut self, sniffer: Box<dyn MimeSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// The model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Dress the user in the outfit.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::InputPrecondition`] if either image is empty,
    /// or a transport error if the capability call fails.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<NormalizedResult, TryOnError> {
        require_image(&request.user_image, "user image")?;
        require_image(&request.outfit_image, "outfit image")?;

        let parts = vec![
            self.sniffed_part(&request.user_image),
            self.sniffed_part(&request.outfit_image),
            Part::Text(request.instruction.clone()),
        ];
        self.submit(parts).await
    }

    /// Apply an edit to a generated image.
    ///
    /// The source is labelled `image/png` regardless of its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TryOnError::InputPrecondition`] if the source image is
    /// empty, or a transport error if the capability call fails.
    pub async fn refine(
        &self,
        request: &RefinementRequest,
    ) -> Result<NormalizedResult, TryOnError> {
        require_image(&request.source_image, "source image")?;

        let parts = vec![
            Part::Image(ImagePayload::new(request.source_image.data.clone(), mime::PNG)),
            Part::Text(request.instruction.clone()),
        ];
        self.submit(parts).await
    }

    fn sniffed_part(&self, image: &ImagePayload) -> Part {
        let mime_type = self.sniffer.sniff(&image.data);
        Part::Image(ImagePayload::new(image.data.clone(), mime_type))
    }

    async fn submit(&self, parts: Vec<Part>) -> Result<NormalizedResult, TryOnError> {
        let request = CapabilityRequest {
            model: self.model.clone(),
            parts,
            modalities: vec![Modality::Image, Modality::Text],
        };
        debug!(model = %request.model, parts = request.parts.len(), "submitting request");

        let response = self.capability.submit(&request).await?;
        let result = normalize(&response);
        if result.is_empty() {
            debug!("reply contained nothing usable");
        }
        debug!(
            candidates = response.candidates.len(),
            image = result.image.is_some(),
            text = result.text.is_some(),
            "normalized reply"
        );
        Ok(result)
    }
}

fn require_image(image: &ImagePayload, what: &str) -> Result<(), TryOnError> {
    if image.is_empty() {
        Err(TryOnError::InputPrecondition(format!("{what} is empty")))
    } else {
        Ok(())
    }
}
