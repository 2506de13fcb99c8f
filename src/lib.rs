//! A single-writer, multi-reader state propagation engine.
//!
//! A [`Store`] holds one current state, derives each new state from the
//! previous one with a caller-supplied reducer, and fans the result out to
//! any number of observers. Action sources registered as *hot* stay
//! connected for the store's entire lifetime; *cold* sources are connected
//! only while at least one state observer is attached.

mod action;
mod cell;
mod observer;
mod reduce;
mod sinks;
mod source;
mod store;
mod stream;
mod subscription;

pub use action::*;
pub use cell::*;
pub use observer::*;
pub use reduce::*;
pub use source::*;
pub use store::*;
pub use stream::*;
pub use subscription::*;
