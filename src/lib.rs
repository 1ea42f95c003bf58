//! Task timer, project tracker and notes manager for the terminal. All state
//! lives in flat text files under one directory, so everything can be read,
//! fixed, or grepped with ordinary tools.
//!

pub mod cli;
pub mod fs;
pub mod storage;
pub mod utils;
