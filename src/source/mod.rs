//! Message and attachment sources backed by saved Gmail API responses.

pub mod date;
pub mod gmail;
pub mod payload;
