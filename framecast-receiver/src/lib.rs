//! # framecast-receiver
//!
//! Listens for a single `framecast-sender` at a time, decodes each
//! frame and shows it on the attached display. Between sessions the
//! display shows a placeholder with the host's name and network
//! identity.

pub mod config;
pub mod display;
pub mod status;
