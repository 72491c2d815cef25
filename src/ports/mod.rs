//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod capability;

pub use capability::{
    Candidate, Capability, CapabilityRequest, CapabilityResponse, ImagePayload, Modality, Part,
};
