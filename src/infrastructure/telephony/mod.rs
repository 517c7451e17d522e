//! Telephony transport rendering

pub mod twiml;

pub use twiml::{escape_xml, final_response, gather_response, GatherSettings};
