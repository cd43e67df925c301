//! Utility functions for common operations.
//!
//! - **Base URL validation**: HTTPS enforcement for the service endpoint
//! - **Text processing**: Unicode-aware width calculation, truncation and
//!   control character stripping for anything rendered into the terminal

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_chars, truncate_to_width};
pub use url_validator::{host_label, validate_base_url, UrlValidationError};
