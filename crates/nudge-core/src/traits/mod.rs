//! Collaborator traits: completion, storage and transport.

mod llm;
mod store;
mod transport;

pub use llm::*;
pub use store::*;
pub use transport::*;
