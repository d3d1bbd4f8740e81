//! Command implementations for gadgetize CLI

pub mod cache;
pub mod completions;
pub mod patch;
pub mod version;
