//! The two firmware tasks.
//!
//! Each runs as its own thread pinned to a core and touches the other only
//! through [`SharedState`](crate::state::SharedState) — no direct
//! task-to-task calls anywhere.

pub mod acquisition;
pub mod network;
