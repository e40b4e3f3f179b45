//! Wire protocol for the supervisory message bus.

pub mod codec;
