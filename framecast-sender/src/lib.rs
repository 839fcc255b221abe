//! # framecast-sender
//!
//! Captures a rectangle of a screen-like source, encodes it as JPEG or
//! PNG and streams it to a `framecast-receiver` over TCP or UDP,
//! reconnecting with a fixed backoff whenever the link drops.

pub mod config;
pub mod source;
