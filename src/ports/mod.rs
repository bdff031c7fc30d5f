//! Ports (trait boundaries) for external collaborators.
//!
//! The training loop itself knows nothing about progress bars, metrics or
//! front-ends; those attach through the traits defined here.

pub mod observer;

pub use observer::Observer;
