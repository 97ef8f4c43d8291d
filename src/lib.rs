//! Credit Health Dashboard Client Library
//!
//! This library drives a client's credit health dashboard: it fetches the
//! profile and the generated explanation, requests product recommendations
//! once the explanation is available, normalizes the loosely-shaped content
//! the backends return, and batches profile edits into one sparse update.
//!
//! # Modules
//!
//! - `client`: HTTP client for the profile data API and the explanation service.
//! - `config`: Configuration management.
//! - `content`: Normalization of backend payloads into render sections.
//! - `edit_buffer`: Pending profile edits and the sparse update they produce.
//! - `errors`: Error handling types.
//! - `health`: Credit health badge classification.
//! - `models`: Wire types and lenient coercion helpers.
//! - `orchestrator`: Fetch sequencing and the dashboard state machine.
//! - `render`: Plain-text rendering of the dashboard.
//! - `session`: Identity boundary.

pub mod client;
pub mod config;
pub mod content;
pub mod edit_buffer;
pub mod errors;
pub mod health;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod session;
