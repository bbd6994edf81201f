//! cjk-subset CLI library.

pub mod cli;
pub mod config;
