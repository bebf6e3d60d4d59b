//! Core types for nudge.

mod chat;
mod goal;
mod message;
mod profile;

pub use chat::*;
pub use goal::*;
pub use message::*;
pub use profile::*;
