// Plan compiler engine - independent of the CLI

pub mod batch;
pub mod core;
pub mod platform;

pub use core::*;
