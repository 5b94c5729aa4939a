//! Client for an external pose-estimation inference service.
//!
//! [`api::PoseServiceApi`] speaks the service's HTTP protocol;
//! [`source::PoseServiceSource`] adapts it to the engine's
//! [`LandmarkSource`](poslyzer_core::LandmarkSource) trait.

pub mod api;
pub mod source;

pub use api::{PoseApiError, PoseServiceApi};
pub use source::PoseServiceSource;
