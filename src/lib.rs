//! gradle-versioner - bump versionCode and versionName in Android build files.
//!
//! This library provides the core functionality for gradle-versioner, including:
//! - Line-oriented recognition and rewriting of version declarations
//! - Configuration file parsing and cascade discovery
//! - Exporting the resulting versions to automation tooling
//!
//! # Example
//!
//! ```
//! use gradle_versioner::rules::{RewriteRequest, VersionRewriter};
//!
//! let rewriter = VersionRewriter::new().unwrap();
//! let request = RewriteRequest {
//!     new_version_code: Some(100),
//!     version_code_offset: 7,
//!     new_version_name: Some("1.2.0".to_string()),
//! };
//!
//! let result = rewriter
//!     .rewrite_str("versionCode 1\nversionName \"1.0\"\n", &request)
//!     .unwrap();
//!
//! assert_eq!(result.new_content, b"versionCode 107\nversionName \"1.2.0\"\n");
//! assert_eq!(result.final_version_code, "107");
//! assert_eq!(result.version_name_unquoted(), "1.2.0");
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod rules;

pub use error::{Result, VersionerError};
