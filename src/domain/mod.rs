//! Domain layer types and invariants.

pub mod error;
pub mod pages;
pub mod sections;
pub mod slug;
