//! mp4split: command-line front end for `mp4split-media`
//!
//! The library half exposes configuration loading and segment file naming
//! so they can be exercised by integration tests.

pub mod config;
pub mod output;
