use crate::error::{Result, VersionerError};
use crate::rules::matcher::{LineAction, LineMatch, Recognizer, scan};
use std::io::BufRead;
use std::ops::Range;

/// Recognizes `versionCode <token>` declarations (Groovy or Kotlin DSL).
///
/// The captured token is whatever precedes whitespace, an inline `//`
/// comment, or the end of the line, so symbolic values such as
/// `rootProject.ext.versionCode` are captured as well as literals.
/// Punctuation glued to the token (`1;`) is part of it.
pub const VERSION_CODE_PATTERN: &str = r"^versionCode(?:\s|=)+([^\s=/]\S*?)(?:\s|//|$)";

/// Recognizes `versionName <token>` declarations, tried in order.
///
/// A recognizer has a single capture group, so the double-quoted,
/// single-quoted and bare forms each get their own pattern. Quotes are not
/// part of the capture and must pair up; a bare token ends like a versionCode
/// token does.
pub const VERSION_NAME_PATTERNS: [&str; 3] = [
	r#"^versionName(?:\s|=)+"([^"]*)""#,
	r"^versionName(?:\s|=)+'([^']*)'",
	r#"^versionName(?:\s|=)+([^\s"'=/]\S*?)(?:\s|//|$)"#,
];

/// What the caller wants changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteRequest {
	/// New versionCode. `None` leaves versionCode lines untouched.
	pub new_version_code: Option<i64>,

	/// Added to `new_version_code` whenever one is given.
	pub version_code_offset: i64,

	/// New versionName. `None` leaves versionName lines untouched.
	pub new_version_name: Option<String>,
}

impl RewriteRequest {
	/// The versionCode that will actually be written, offset included.
	pub fn effective_version_code(&self) -> Result<Option<i64>> {
		self.new_version_code
			.map(|code| {
				code.checked_add(self.version_code_offset).ok_or(
					VersionerError::VersionCodeOverflow {
						version_code: code,
						offset: self.version_code_offset,
					},
				)
			})
			.transpose()
	}

	/// True when neither field would be touched.
	pub fn is_noop(&self) -> bool {
		self.new_version_code.is_none() && self.new_version_name.is_none()
	}
}

/// Outcome of a rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
	/// The full rewritten content, byte-for-byte identical outside rewritten tokens.
	pub new_content: Vec<u8>,

	/// The written versionCode, or the first one found if none was requested.
	pub final_version_code: String,

	/// The written (double-quoted) versionName, or the first one found.
	pub final_version_name: String,

	/// Number of versionCode lines rewritten.
	pub updated_version_codes: usize,

	/// Number of versionName lines rewritten.
	pub updated_version_names: usize,
}

impl UpdateResult {
	/// The final versionName with surrounding double quotes removed.
	pub fn version_name_unquoted(&self) -> &str {
		self.final_version_name.trim_matches('"')
	}

	/// True if any line was rewritten.
	pub fn changed(&self) -> bool {
		self.updated_version_codes > 0 || self.updated_version_names > 0
	}
}

/// Wrap a version name in double quotes unless it already is.
///
/// Stray leading or trailing double quotes are dropped first, so `"1.2.0`,
/// `1.2.0"` and `1.2.0` all become `"1.2.0"`.
pub fn normalize_version_name(raw: &str) -> String {
	let already_quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
	if already_quoted {
		raw.to_string()
	} else {
		format!("\"{}\"", raw.trim_matches('"'))
	}
}

/// Per-scan accumulator shared by both handlers.
#[derive(Debug, Default)]
struct RewriteState {
	new_version_code: Option<String>,
	new_version_name: Option<String>,
	final_version_code: Option<String>,
	final_version_name: Option<String>,
	updated_version_codes: usize,
	updated_version_names: usize,
}

impl RewriteState {
	fn new(request: &RewriteRequest) -> Result<Self> {
		Ok(RewriteState {
			new_version_code: request.effective_version_code()?.map(|c| c.to_string()),
			new_version_name: request
				.new_version_name
				.as_deref()
				.map(normalize_version_name),
			..Default::default()
		})
	}

	fn into_result(self, new_content: Vec<u8>) -> UpdateResult {
		UpdateResult {
			new_content,
			final_version_code: self.final_version_code.unwrap_or_default(),
			final_version_name: self.final_version_name.unwrap_or_default(),
			updated_version_codes: self.updated_version_codes,
			updated_version_names: self.updated_version_names,
		}
	}
}

fn update_version_code(state: &mut RewriteState, m: &LineMatch<'_>) -> LineAction {
	if state.final_version_code.is_none() {
		state.final_version_code = Some(m.capture_lossy().into_owned());
	}

	let Some(new_code) = state.new_version_code.clone() else {
		return LineAction::Keep;
	};

	let updated = m.replace_capture(new_code.as_bytes());
	log_update(m, &updated);

	state.final_version_code = Some(new_code);
	state.updated_version_codes += 1;
	LineAction::Replace(updated)
}

fn update_version_name(state: &mut RewriteState, m: &LineMatch<'_>) -> LineAction {
	if state.final_version_name.is_none() {
		state.final_version_name = Some(m.capture_lossy().into_owned());
	}

	let Some(new_name) = state.new_version_name.clone() else {
		return LineAction::Keep;
	};

	// The new name carries its own quotes, so swallow the old ones
	let updated = m.replace_range(quoted_range(m), new_name.as_bytes());
	log_update(m, &updated);

	state.final_version_name = Some(new_name);
	state.updated_version_names += 1;
	LineAction::Replace(updated)
}

fn log_update(m: &LineMatch<'_>, updated: &[u8]) {
	log::info!(
		"updating line ({}): {} -> {}",
		m.index,
		String::from_utf8_lossy(m.line),
		String::from_utf8_lossy(updated)
	);
}

/// The capture range widened to a matching pair of surrounding quotes, if any.
fn quoted_range(m: &LineMatch<'_>) -> Range<usize> {
	let Range { start, end } = m.capture_range.clone();

	if start > 0 && end < m.line.len() {
		let (open, close) = (m.line[start - 1], m.line[end]);
		if open == close && (open == b'"' || open == b'\'') {
			return (start - 1)..(end + 1);
		}
	}

	start..end
}

/// Rewrites versionCode / versionName declarations in a build.gradle file.
#[derive(Debug)]
pub struct VersionRewriter {
	recognizers: Vec<Recognizer<RewriteState>>,
}

impl VersionRewriter {
	/// Build the recognizer table. versionCode is tried before versionName.
	pub fn new() -> Result<Self> {
		let mut recognizers = vec![Recognizer::new(VERSION_CODE_PATTERN, update_version_code)?];
		for pattern in VERSION_NAME_PATTERNS {
			recognizers.push(Recognizer::new(pattern, update_version_name)?);
		}

		Ok(VersionRewriter { recognizers })
	}

	/// Stream `reader` and apply `request`.
	pub fn rewrite<R: BufRead>(&self, reader: R, request: &RewriteRequest) -> Result<UpdateResult> {
		let mut state = RewriteState::new(request)?;
		let new_content = scan(reader, &self.recognizers, &mut state)?;

		if state.final_version_code.is_none() {
			log::warn!("no versionCode declaration found");
		}
		if state.final_version_name.is_none() {
			log::warn!("no versionName declaration found");
		}

		Ok(state.into_result(new_content))
	}

	/// Apply `request` to in-memory content.
	pub fn rewrite_str(&self, content: &str, request: &RewriteRequest) -> Result<UpdateResult> {
		self.rewrite(content.as_bytes(), request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use regex::Regex;

	fn capture(pattern: &str, content: &str) -> Option<String> {
		Regex::new(pattern)
			.unwrap()
			.captures(content)
			.map(|c| c[1].to_string())
	}

	fn name_capture(content: &str) -> Option<String> {
		VERSION_NAME_PATTERNS
			.iter()
			.find_map(|pattern| capture(pattern, content))
	}

	fn text(result: &UpdateResult) -> &str {
		std::str::from_utf8(&result.new_content).unwrap()
	}

	fn rewrite(content: &str, request: RewriteRequest) -> UpdateResult {
		VersionRewriter::new()
			.unwrap()
			.rewrite_str(content, &request)
			.unwrap()
	}

	fn code(new_version_code: i64) -> RewriteRequest {
		RewriteRequest {
			new_version_code: Some(new_version_code),
			..Default::default()
		}
	}

	fn name(new_version_name: &str) -> RewriteRequest {
		RewriteRequest {
			new_version_name: Some(new_version_name.to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_version_code_pattern() {
		for (content, want) in [
			("versionCode 1", "1"),
			("versionCode 1//close comment", "1"),
			("versionCode 1 // far comment", "1"),
			("versionCode myWar", "myWar"),
			("versionCode myWar//close comment", "myWar"),
			("versionCode = 1", "1"),
			("versionCode =1//close comment", "1"),
			("versionCode= 1 // far comment", "1"),
			("versionCode   =  myWar//close comment", "myWar"),
			("versionCode=1//x", "1"),
			("versionCode 1\n", "1"),
			("versionCode  = myWar // far comment\n", "myWar"),
		] {
			assert_eq!(
				capture(VERSION_CODE_PATTERN, content).as_deref(),
				Some(want),
				"content: {content:?}"
			);
		}
	}

	#[test]
	fn test_version_name_pattern() {
		for (content, want) in [
			(r#"versionName "1.0""#, "1.0"),
			(r#"versionName "1.0"//close comment"#, "1.0"),
			(r#"versionName "1.0" // far comment"#, "1.0"),
			("versionName '1.0'", "1.0"),
			("versionName '1.0'//close comment", "1.0"),
			("versionName = '1.0' // far comment", "1.0"),
			(r#"versionName="1.0" // far comment"#, "1.0"),
			("versionName myWar", "myWar"),
			("versionName myWar//close comment", "myWar"),
			("versionName = myWar // far comment", "myWar"),
			("versionName=myWar // far comment", "myWar"),
			("versionName = '1.0' // far comment\n", "1.0"),
			("versionName myWar\n", "myWar"),
		] {
			assert_eq!(
				name_capture(content).as_deref(),
				Some(want),
				"content: {content:?}"
			);
		}
	}

	#[test]
	fn test_patterns_ignore_lookalikes() {
		for content in [
			r#"def versionCodes = ["armeabi-v7a": 1, "x86": 2]"#,
			"versionCodes.get(abi) * 1000 + defaultConfig.versionCode",
			"// versionCode 1",
			"versionCode",
			"versionCode // nothing here",
		] {
			assert!(
				capture(VERSION_CODE_PATTERN, content).is_none(),
				"content: {content:?}"
			);
		}
		assert!(name_capture("versionNameSuffix \"-dev\"").is_none());
		assert!(name_capture("output.versionNameOverride = name").is_none());
	}

	#[test]
	fn test_updates_version_code_variable() {
		let got = rewrite("versionCode rootProject.ext.versionCode", code(555));
		assert_eq!(
			got,
			UpdateResult {
				new_content: b"versionCode 555".to_vec(),
				final_version_code: "555".to_string(),
				updated_version_codes: 1,
				..Default::default()
			}
		);
	}

	#[test]
	fn test_updates_version_name_variable() {
		let got = rewrite("versionName rootProject.ext.versionName", name(r#""1.1.0""#));
		assert_eq!(
			got,
			UpdateResult {
				new_content: br#"versionName "1.1.0""#.to_vec(),
				final_version_name: r#""1.1.0""#.to_string(),
				updated_version_names: 1,
				..Default::default()
			}
		);
	}

	#[test]
	fn test_quotes_unquoted_version_name() {
		for requested in ["1.2.0", r#""1.2.0"#, r#"1.2.0""#] {
			let got = rewrite("versionName rootProject.ext.versionName", name(requested));
			assert_eq!(text(&got), r#"versionName "1.2.0""#);
			assert_eq!(got.final_version_name, r#""1.2.0""#);
			assert_eq!(got.version_name_unquoted(), "1.2.0");
		}
	}

	#[test]
	fn test_replaces_quoted_version_name_without_double_quoting() {
		let got = rewrite(r#"    versionName "1.0" // beta"#, name("2.0"));
		assert_eq!(text(&got), r#"    versionName "2.0" // beta"#);

		let got = rewrite("versionName = '1.0'", name("2.0"));
		assert_eq!(text(&got), r#"versionName = "2.0""#);
	}

	#[test]
	fn test_does_not_touch_abi_version_code_mapping() {
		let content = r#"def versionCodes = ["armeabi-v7a": 1, "x86": 2, "arm64-v8a": 3, "x86_64": 4]"#;
		let got = rewrite(content, code(555));
		assert_eq!(text(&got), content);
		assert_eq!(got.updated_version_codes, 0);
		assert_eq!(got.final_version_code, "");
	}

	#[test]
	fn test_does_not_touch_per_abi_version_selector() {
		let content = "versionCodes.get(abi) * 1000 + defaultConfig.versionCode";
		let got = rewrite(content, code(555));
		assert_eq!(text(&got), content);
		assert_eq!(got.updated_version_codes, 0);
	}

	#[test]
	fn test_offset_is_added() {
		let got = rewrite(
			"versionCode 1",
			RewriteRequest {
				new_version_code: Some(100),
				version_code_offset: 7,
				..Default::default()
			},
		);
		assert_eq!(got.final_version_code, "107");
		assert_eq!(text(&got), "versionCode 107");
	}

	#[test]
	fn test_offset_alone_changes_nothing() {
		let got = rewrite(
			"versionCode 1",
			RewriteRequest {
				version_code_offset: 7,
				..Default::default()
			},
		);
		assert_eq!(got.final_version_code, "1");
		assert_eq!(text(&got), "versionCode 1");
		assert_eq!(got.updated_version_codes, 0);
	}

	#[test]
	fn test_offset_overflow() {
		let request = RewriteRequest {
			new_version_code: Some(i64::MAX),
			version_code_offset: 1,
			..Default::default()
		};
		match VersionRewriter::new()
			.unwrap()
			.rewrite_str("versionCode 1", &request)
			.unwrap_err()
		{
			VersionerError::VersionCodeOverflow { .. } => {}
			e => panic!("Expected VersionCodeOverflow, got {e:?}"),
		}
	}

	#[test]
	fn test_noop_request_is_identity() {
		let content = "android {\n    defaultConfig {\n        versionCode 12 // rc\n        versionName \"1.4.0\"\n    }\n}\n";
		let got = rewrite(content, RewriteRequest::default());
		assert_eq!(text(&got), content);
		assert_eq!(got.updated_version_codes, 0);
		assert_eq!(got.updated_version_names, 0);
		assert_eq!(got.final_version_code, "12");
		assert_eq!(got.final_version_name, "1.4.0");
		assert!(!got.changed());
	}

	#[test]
	fn test_noop_reports_first_declaration() {
		let content = "versionCode 1\nversionCode 2\nversionName 'a'\nversionName 'b'";
		let got = rewrite(content, RewriteRequest::default());
		assert_eq!(got.final_version_code, "1");
		assert_eq!(got.final_version_name, "a");
	}

	#[test]
	fn test_comment_tolerance() {
		let got = rewrite("versionCode 1 // release candidate", code(2));
		assert_eq!(text(&got), "versionCode 2 // release candidate");

		let got = rewrite("versionCode=1//x", code(2));
		assert_eq!(text(&got), "versionCode=2//x");
	}

	#[test]
	fn test_single_occurrence_replacement() {
		let got = rewrite("versionCode 1 // was 1 before 1", code(9));
		assert_eq!(text(&got), "versionCode 9 // was 1 before 1");
	}

	#[test]
	fn test_token_inside_keyword_is_not_rewritten() {
		let got = rewrite("versionName Name", name("3.0"));
		assert_eq!(text(&got), r#"versionName "3.0""#);
	}

	#[test]
	fn test_counts_both_fields() {
		let content = "\
android {
    defaultConfig {
        applicationId \"com.example\"
        versionCode 1
        versionName \"1.0\"
    }
    def versionCodes = [\"armeabi-v7a\": 1, \"x86\": 2]
}
";
		let got = rewrite(
			content,
			RewriteRequest {
				new_version_code: Some(42),
				version_code_offset: 0,
				new_version_name: Some("2.0.1".to_string()),
			},
		);

		assert_eq!(got.updated_version_codes, 1);
		assert_eq!(got.updated_version_names, 1);
		assert_eq!(got.final_version_code, "42");
		assert_eq!(got.final_version_name, r#""2.0.1""#);
		assert_eq!(
			text(&got),
			content
				.replace("versionCode 1", "versionCode 42")
				.replace("versionName \"1.0\"", "versionName \"2.0.1\"")
		);
	}

	#[test]
	fn test_kotlin_dsl() {
		let content = "versionCode = 3\nversionName = \"0.3\"\n";
		let got = rewrite(
			content,
			RewriteRequest {
				new_version_code: Some(4),
				new_version_name: Some("0.4".to_string()),
				..Default::default()
			},
		);
		assert_eq!(text(&got), "versionCode = 4\nversionName = \"0.4\"\n");
	}

	#[test]
	fn test_normalize_version_name() {
		assert_eq!(normalize_version_name("1.0"), r#""1.0""#);
		assert_eq!(normalize_version_name(r#""1.0""#), r#""1.0""#);
		assert_eq!(normalize_version_name(r#""1.0"#), r#""1.0""#);
		assert_eq!(normalize_version_name(r#"1.0""#), r#""1.0""#);
		assert_eq!(normalize_version_name(r#"""1.0"#), r#""1.0""#);
		assert_eq!(normalize_version_name("\""), r#""""#);
	}

	#[test]
	fn test_request_is_noop() {
		assert!(RewriteRequest::default().is_noop());
		assert!(
			RewriteRequest {
				version_code_offset: 3,
				..Default::default()
			}
			.is_noop()
		);
		assert!(!code(1).is_noop());
		assert!(!name("1").is_noop());
	}

	#[test]
	fn test_version_name_keeps_trailing_text() {
		let got = rewrite("versionName myWar + suffix", name("2.0"));
		assert_eq!(text(&got), r#"versionName "2.0" + suffix"#);
		assert_eq!(got.updated_version_names, 1);

		let got = rewrite(r#"versionName "1.0" + suffix"#, name("2.0"));
		assert_eq!(text(&got), r#"versionName "2.0" + suffix"#);
		assert_eq!(got.updated_version_names, 1);

		let got = rewrite(r#"versionName "1.0 beta" // rc"#, name("2.0"));
		assert_eq!(text(&got), r#"versionName "2.0" // rc"#);
	}

	#[test]
	fn test_quoted_version_name_may_contain_slashes() {
		let got = rewrite(r#"versionName "http://x""#, RewriteRequest::default());
		assert_eq!(got.final_version_name, "http://x");

		let got = rewrite(r#"versionName "http://x" // docs"#, name("1.0"));
		assert_eq!(text(&got), r#"versionName "1.0" // docs"#);
	}

	#[test]
	fn test_mismatched_quotes_are_not_a_declaration() {
		let content = r#"versionName '1.0""#;
		assert!(name_capture(content).is_none());

		let got = rewrite(content, name("2.0"));
		assert_eq!(text(&got), content);
		assert_eq!(got.updated_version_names, 0);
	}

	#[test]
	fn test_version_code_token_runs_to_whitespace() {
		// Anything glued to the token belongs to it
		let got = rewrite("versionCode 1;", code(2));
		assert_eq!(text(&got), "versionCode 2");

		let got = rewrite("versionCode 1;", RewriteRequest::default());
		assert_eq!(got.final_version_code, "1;");

		let got = rewrite("versionCode 1 ;", code(2));
		assert_eq!(text(&got), "versionCode 2 ;");
	}

	#[test]
	fn test_non_utf8_content_is_rewritten() {
		let content: &[u8] = b"// Autor: Jos\xe9\nversionCode 1\nversionName \"1.0\" // \xe9t\xe9\n";
		let got = VersionRewriter::new()
			.unwrap()
			.rewrite(
				content,
				&RewriteRequest {
					new_version_code: Some(2),
					new_version_name: Some("2.0".to_string()),
					..Default::default()
				},
			)
			.unwrap();

		assert_eq!(
			got.new_content,
			b"// Autor: Jos\xe9\nversionCode 2\nversionName \"2.0\" // \xe9t\xe9\n"
		);
		assert_eq!(got.updated_version_codes, 1);
		assert_eq!(got.updated_version_names, 1);
	}
}
