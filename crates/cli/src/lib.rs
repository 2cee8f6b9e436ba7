//! Axiom CLI support library
//!
//! This crate provides:
//! - System configuration (TOML file plus environment overrides)
//! - Logging setup (env filter, optional daily-rolling file)
//! - Output formatting shared by the commands

pub mod logging;
pub mod system_config;
pub mod util;
