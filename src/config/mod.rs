//! Configuration module for bannergen.
//!
//! This module wires together the `BannerConfig` data model, its semantic error
//! type and the loading/validation helpers. Import from here for a stable API.
//!
//! Example:
//! use bannergen::config::load_from_path;
//!
//! let cfg = load_from_path("banner.json")?;

pub mod error;
pub mod loader;
pub mod models;

pub use error::ConfigError;

// Re-export core data models
pub use models::{
    Advanced, Animation, BannerConfig, BannerPosition, BannerText, Behavior, BorderRadius,
    Branding, ButtonLayout, Colors, Compliance, ComplianceFramework, FloatingPosition,
    FloatingShape, FloatingSize, FloatingStyle, FooterIcons, FooterLink, FooterLinkPosition,
    FooterLinkStyle, GoogleAnalytics, InlineLinkType, InlineStyle, Integrations, Language, Layout,
    LayoutWidth, Logo, LogoPosition, Margin, Performance, PrivacyPolicy, Scripts, Shadow, Spacing,
    Theme, TrackingCategory, TrackingScript,
};

// Re-export loader utilities
pub use loader::{
    generate_schema, load_from_path, load_from_path_async, load_from_reader, load_from_str,
    validate_config, write_schema_to_writer,
};
