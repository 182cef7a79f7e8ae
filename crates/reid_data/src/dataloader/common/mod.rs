//! Utilities shared by the inline and worker loading paths.

pub mod thread;
