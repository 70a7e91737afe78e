//! Test doubles for Moneta crates: scripted advisor backends and an
//! in-memory chat store.

mod backend;
mod store;

pub use backend::{FailingBackend, FixedBackend, GatedBackend, RecordingBackend};
pub use store::MemoryChatStore;
