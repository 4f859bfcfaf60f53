//! Windowed SD card browser: a background directory enumerator feeding a
//! bounded view model, with tabbed category filters and a pinned-favorites
//! list.

pub mod actions;
pub mod apps;
pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod history;
pub mod launcher;
pub mod path;
pub mod storage;
pub mod tabs;
pub mod worker;
