//! Core data model types: messages, senders, sender groups, and attachments.

pub mod address;
pub mod attachment;
pub mod group;
pub mod message;
