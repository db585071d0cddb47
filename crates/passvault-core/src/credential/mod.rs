//! Credentials and the repository that seals them into storage

mod repository;
mod types;

pub use repository::CredentialRepository;
pub use types::*;
