//! Bootstrap module for initializing the pairwatch server
//!
//! This module handles:
//! - Configuration loading
//! - Service initialization and seeding

pub mod config;
pub mod services;

pub use config::load_config;
pub use services::{init_services, Services};
