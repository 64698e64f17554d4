//! Display formatting for terminal output
//!
//! Renders audit events as tables and detail views.

pub mod event;

pub use event::{format_event_details, format_event_list};
