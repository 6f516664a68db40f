//! Consumer-side handlers applied from the event stream.

pub mod mirror;

pub use mirror::MirrorHandler;
