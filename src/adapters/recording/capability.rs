//! Recording adapter for the `Capability` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::capability::{Capability, CapabilityRequest, SubmitFuture};

/// Records capability calls while delegating to an inner implementation.
pub struct RecordingCapability {
    inner: Box<dyn Capability>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingCapability {
    /// Creates a new recording capability wrapping the given implementation.
    pub fn new(inner: Box<dyn Capability>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Capability for RecordingCapability {
    fn submit(&self, request: &CapabilityRequest) -> SubmitFuture<'_> {
        let request_clone = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.submit(&request_clone).await;
            record_result(&recorder, "capability", "submit", &request_clone, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{png, FakeCapability};
    use crate::ports::{Modality, Part};

    #[tokio::test]
    async fn records_request_and_result() {
        let dir = std::env::temp_dir().join("tryon_recording_capability_test");
        let path = dir.join("capability.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "rec", "abc")));
        let fake = FakeCapability::answering(vec![Part::Image(png(1))]);
        let recording = RecordingCapability::new(Box::new(fake), Arc::clone(&recorder));

        let request = CapabilityRequest {
            model: "gemini-test".into(),
            parts: vec![Part::Text("hello".into())],
            modalities: vec![Modality::Image, Modality::Text],
        };
        recording.submit(&request).await.unwrap();
        drop(recording);

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        let written = recorder.finish().unwrap();
        let content = std::fs::read_to_string(&written).unwrap();
        assert!(content.contains("port: capability"));
        assert!(content.contains("method: submit"));
        assert!(content.contains("gemini-test"));
        assert!(content.contains("Ok"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
