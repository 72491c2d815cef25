//! Unified error type for tryon.

use thiserror::Error;

/// Errors that can occur while generating or refining a try-on image.
#[derive(Debug, Error)]
pub enum TryOnError {
    /// The image service returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code (0 for replayed failures).
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The call succeeded but the reply carried no usable image.
    #[error("{}", empty_result_message(.text.as_deref()))]
    EmptyResult {
        /// Text the model sent back instead of an image, if any.
        text: Option<String>,
    },

    /// Required input was missing or empty; nothing was sent.
    #[error("Missing input: {0}")]
    InputPrecondition(String),

    /// A generation or refinement is already in flight.
    #[error("A request is already in progress")]
    Busy,

    /// Refinement was requested before any image was generated.
    #[error("Nothing to refine: generate a try-on image first")]
    NothingToRefine,

    /// A background preset name did not match any known preset.
    #[error("Unknown background '{0}'. Valid: white-studio, city-street, runway")]
    UnknownBackground(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured.
    #[error("No API key for Gemini. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The environment variable name.
        env_var: String,
    },
}

impl TryOnError {
    /// Whether the failure came from talking to the image service.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Network(_))
    }
}

fn empty_result_message(text: Option<&str>) -> String {
    match text {
        Some(t) => format!("The model could not process the request: {t}"),
        None => "The model could not process the request (no image returned)".to_string(),
    }
}
