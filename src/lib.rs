//! Signal Deck: swipe-to-triage engine for product feedback.

pub mod cli;
pub mod collections;
pub mod config;
pub mod deck;
pub mod error;
pub mod import;
