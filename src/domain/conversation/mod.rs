//! Per-call conversation state

pub mod capabilities;
pub mod session;
pub mod slots;
pub mod step;
pub mod store;

pub use capabilities::Capabilities;
pub use session::{CallSession, Speaker, Turn};
pub use slots::{Slot, SlotValue, Slots};
pub use step::Step;
pub use store::SessionStore;
