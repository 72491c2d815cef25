//! Replaying adapter for the `Capability` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::TryOnError;
use crate::ports::capability::{Capability, CapabilityRequest, CapabilityResponse, SubmitFuture};

/// Serves recorded capability replies from a cassette.
pub struct ReplayingCapability {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingCapability {
    /// Create a replaying capability backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl Capability for ReplayingCapability {
    fn submit(&self, _request: &CapabilityRequest) -> SubmitFuture<'_> {
        let output = next_output(&self.replayer, "capability", "submit");
        Box::pin(async move {
            let output = output.map_err(|e| TryOnError::Config(format!("Replay failed: {e}")))?;
            replay_result::<CapabilityResponse>(output)
                .map_err(|message| TryOnError::Api { status: 0, message })
        })
    }
}
