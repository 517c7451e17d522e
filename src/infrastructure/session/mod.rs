//! Session store implementations

pub mod memory;

pub use memory::InMemorySessionStore;
