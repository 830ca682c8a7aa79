//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the metadata stores, audio storage and background tasks.

mod podcast;
mod side_effects;

pub use podcast::{
    PodcastService, PodcastServiceOptions, UploadOutcome, UploadRequest,
    validate_audio_content_type,
};
pub use side_effects::{SideEffectReport, SideEffects, observe};
