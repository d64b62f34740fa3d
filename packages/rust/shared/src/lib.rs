//! Shared types, error model, and configuration for sitebuild.
//!
//! This crate is the foundation depended on by all other sitebuild crates.
//! It provides:
//! - [`SitebuildError`] — the unified error type
//! - Configuration ([`Config`], config loading)
//! - Banner rendering ([`banner::render`])

pub mod banner;
pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    Config, HtmlConfig, MediaConfig, PathsConfig, ScriptsConfig, ServeConfig, SiteConfig,
    StylesConfig, VendorEntry, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SitebuildError};
