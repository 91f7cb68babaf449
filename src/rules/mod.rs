//! Line recognizers and version rewriting for gradle-versioner.
//!
//! This module handles:
//! - First-match-wins dispatch of lines to (pattern, handler) recognizers
//! - Rewriting versionCode and versionName declarations

pub mod matcher;
pub mod rewriter;

pub use matcher::{
	Handler, LineAction, LineMatch, Recognizer, find_matching_recognizer, process_line, scan,
};
pub use rewriter::{
	RewriteRequest, UpdateResult, VERSION_CODE_PATTERN, VERSION_NAME_PATTERNS, VersionRewriter,
	normalize_version_name,
};
