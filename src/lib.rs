//! `gmailctrl` — cut Gmail clutter from the terminal.
//!
//! This crate provides the core library for grouping messages by sender,
//! planning bulk archive/trash actions, and downloading attachments into a
//! dated, collision-free local archive.

pub mod analysis;
pub mod config;
pub mod download;
pub mod error;
pub mod i18n;
pub mod model;
pub mod source;
