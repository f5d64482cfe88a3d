pub mod profile_models;
pub mod profile_service;
pub mod prompt_builder;

pub use profile_models::{DetailSelection, ProfileConfig};
pub use profile_service::{
    CompletionError, CompletionProvider, CompletionRequest, ProfileService,
};
