//! Triage Assist — guided symptom triage over a conversational flow.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod transcript;
