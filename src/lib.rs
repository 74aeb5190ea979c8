// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Pulmo: Chest X-ray Screening Demo
//!
//! Upload one image, run it through a classifier (a fixed mock by default,
//! optionally a local vision model), and review the findings.

pub mod analysis;
pub mod config;
pub mod controller;
pub mod error;
pub mod ollama;
pub mod preview;
pub mod render;
pub mod upload;
pub mod web;

pub use config::AppConfig;
pub use controller::{Controller, Snapshot, View};
pub use error::{PulmoError, Result};
