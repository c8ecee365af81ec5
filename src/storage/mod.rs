//! In-process implementations of the collaborator traits

pub mod in_memory;
pub mod interpreter;

pub use in_memory::{InMemoryLikedSet, InMemoryListingStore};
pub use interpreter::{FixedInterpreter, NoInterpreter};
