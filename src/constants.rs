//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Live preview constants
pub mod preview {
    /// Stable identifier of the single injected style element
    pub const STYLE_ELEMENT_ID: &str = "stylesync-live-preview-css";

    /// Debounce window for coalescing rapid setting changes (milliseconds)
    pub const DEBOUNCE_MS: u64 = 300;

    /// Body selector suffix active while dark mode is enabled
    pub const DARK_MODE_CLASS: &str = "stylesync-dark";
}

/// HTTP boundary constants
pub mod http {
    /// Default versioned base path of the settings backend
    pub const DEFAULT_BASE_URL: &str = "http://localhost/wp-json/stylesync/v1";

    /// Header carrying the anti-forgery token on every request
    pub const NONCE_HEADER: &str = "X-Nonce";

    /// TCP connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 2;

    /// Default whole-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// Client configuration file constants
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "stylesync";

    /// Config file name
    pub const FILENAME: &str = "config.toml";
}

/// Validation ranges for config values
pub mod validation {
    /// Maximum request timeout a user may configure (seconds)
    pub const MAX_TIMEOUT_SECS: u64 = 120;

    /// Maximum debounce window a user may configure (milliseconds)
    pub const MAX_DEBOUNCE_MS: u64 = 5_000;
}
