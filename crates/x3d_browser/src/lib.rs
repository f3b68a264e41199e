// SPDX-License-Identifier: MIT OR Apache-2.0
//! External authoring interface for the X3D browser runtime.
//!
//! This crate hosts a live scene and lets other threads drive it:
//! - A [`Browser`] that ticks a scene on its own simulation thread
//! - Typed SAI handles ([`SaiNode`], [`SaiField`], [`SaiMultiField`])
//! - RON configuration and `tracing` setup
//!
//! ## Architecture
//!
//! The simulation thread owns the [`x3d_scene::Scene`]. Every other
//! thread works through cloned [`x3d_scene::SceneHandle`]s: reads go
//! straight to the fields, writes are queued and land at the next tick.

pub mod browser;
pub mod config;
pub mod logging;
pub mod sai;

pub use browser::{Browser, BrowserError, BrowserStats, RunState};
pub use config::{BrowserConfig, ConfigError, CONFIG_FORMAT_VERSION, DEFAULT_LOG_FILTER};
pub use logging::{init_tracing, try_init_tracing, LoggingError};
pub use sai::{SaiField, SaiMultiField, SaiNode};
