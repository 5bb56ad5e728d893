//! Utilities for bannergen.
//!
//! Submodules:
//! - `escape`: HTML/JS/CSS escaping and tracking-code encoding.
//! - `markup`: escape-by-default HTML element and inline-style builders.
//! - `template`: `{{ slot }}` templates filled with context-encoded fragments.
//! - `color`: color parsing for alpha-blended derived colors.

pub mod color;
pub mod escape;
pub mod markup;
pub mod template;
