//! Data types exchanged with the Daily API.

pub mod credential;
pub mod envelope;
pub mod journal;
pub mod request;
