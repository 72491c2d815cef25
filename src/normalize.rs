//! Reduces a capability reply to at most one image and one text.

use crate::ports::{CapabilityResponse, ImagePayload, Part};

/// The uniform output of both generation and refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedResult {
    /// First image part found, if any.
    pub image: Option<ImagePayload>,
    /// First text part found, if any.
    pub text: Option<String>,
}

impl NormalizedResult {
    /// True when the reply contained nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.text.is_none()
    }
}

/// Extract the first image and first text from the first candidate.
///
/// Later image or text parts are ignored. Missing candidates or parts yield
/// an empty result rather than an error.
#[must_use]
pub fn normalize(response: &CapabilityResponse) -> NormalizedResult {
    let mut result = NormalizedResult::default();
    let Some(candidate) = response.candidates.first() else {
        return result;
    };

    for part in &candidate.parts {
        match part {
            Part::Image(payload) if result.image.is_none() && !payload.is_empty() => {
                result.image = Some(payload.clone());
            }
            Part::Text(text) if result.text.is_none() && !text.is_empty() => {
                result.text = Some(text.clone());
            }
            _ => {}
        }
        if result.image.is_some() && result.text.is_some() {
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Candidate;

    fn image(byte: u8) -> Part {
        Part::Image(ImagePayload::new(vec![byte], "image/png"))
    }

    fn text(s: &str) -> Part {
        Part::Text(s.to_string())
    }

    fn response(parts: Vec<Part>) -> CapabilityResponse {
        CapabilityResponse { candidates: vec![Candidate { parts }] }
    }

    #[test]
    fn no_candidates_is_empty() {
        let result = normalize(&CapabilityResponse::default());
        assert!(result.is_empty());
    }

    #[test]
    fn candidate_without_parts_is_empty() {
        let result = normalize(&response(vec![]));
        assert!(result.is_empty());
    }

    #[test]
    fn first_image_and_first_text_win() {
        let interleavings = [
            vec![image(1), text("a"), image(2), text("b")],
            vec![text("a"), image(1), text("b"), image(2)],
            vec![text("a"), text("b"), image(1), image(2)],
            vec![image(1), image(2), text("a"), text("b")],
        ];
        for parts in interleavings {
            let result = normalize(&response(parts));
            assert_eq!(result.image.unwrap().data, vec![1]);
            assert_eq!(result.text.as_deref(), Some("a"));
        }
    }

    #[test]
    fn image_only() {
        let result = normalize(&response(vec![image(7)]));
        assert!(result.text.is_none());
        assert_eq!(result.image.unwrap().mime_type, "image/png");
    }

    #[test]
    fn text_only_is_not_empty() {
        let result = normalize(&response(vec![text("I can't do that")]));
        assert!(result.image.is_none());
        assert!(!result.is_empty());
    }

    #[test]
    fn empty_parts_are_skipped() {
        let parts =
            vec![Part::Image(ImagePayload::new(vec![], "image/png")), text(""), image(3), text("ok")];
        let result = normalize(&response(parts));
        assert_eq!(result.image.unwrap().data, vec![3]);
        assert_eq!(result.text.as_deref(), Some("ok"));
    }

    #[test]
    fn only_first_candidate_is_read() {
        let resp = CapabilityResponse {
            candidates: vec![Candidate { parts: vec![] }, Candidate { parts: vec![image(9)] }],
        };
        assert!(normalize(&resp).is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        let resp = response(vec![text("hi"), image(4), image(5)]);
        assert_eq!(normalize(&resp), normalize(&resp));
    }
}
