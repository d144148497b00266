//! tutorhq-core: lesson unlock, quiz scoring and reward engine.
//!
//! This crate defines the catalog and student data model, the pure rules that
//! decide what is unlocked, passed and rewarded, and the collaborator traits
//! (storage, clock) that hosts wire in around them.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod quiz;
pub mod record;
pub mod roster;
pub mod session;
pub mod store;
pub mod traits;
