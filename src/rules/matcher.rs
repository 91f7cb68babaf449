use crate::error::{Result, VersionerError};
use regex::bytes::Regex;
use std::borrow::Cow;
use std::io::BufRead;
use std::ops::Range;

/// Callback invoked for a line matched by a recognizer.
///
/// `S` is the caller's accumulator; the matcher itself keeps no state
/// between lines.
pub type Handler<S> = fn(&mut S, &LineMatch<'_>) -> LineAction;

/// A line matched by a recognizer, as seen by its handler.
///
/// Lines are raw bytes: build files are not required to be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
	/// The original, untrimmed line (without its `\n` terminator).
	pub line: &'a [u8],

	/// 0-based position of the line in the input.
	pub index: usize,

	/// The captured token.
	pub capture: &'a [u8],

	/// Byte range of the capture inside `line`.
	pub capture_range: Range<usize>,
}

impl<'a> LineMatch<'a> {
	/// The captured token as text, with invalid UTF-8 replaced.
	pub fn capture_lossy(&self) -> Cow<'a, str> {
		String::from_utf8_lossy(self.capture)
	}

	/// Replace the captured token with `replacement`, leaving the rest of the line verbatim.
	pub fn replace_capture(&self, replacement: &[u8]) -> Vec<u8> {
		self.replace_range(self.capture_range.clone(), replacement)
	}

	/// Replace an arbitrary byte range of the line.
	pub fn replace_range(&self, range: Range<usize>, replacement: &[u8]) -> Vec<u8> {
		let mut out = Vec::with_capacity(self.line.len() + replacement.len());
		out.extend_from_slice(&self.line[..range.start]);
		out.extend_from_slice(replacement);
		out.extend_from_slice(&self.line[range.end..]);
		out
	}
}

/// What a handler wants done with its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
	/// Emit the original line unchanged.
	Keep,

	/// Emit this line instead of the original.
	Replace(Vec<u8>),
}

/// A compiled (pattern, handler) pair.
pub struct Recognizer<S> {
	regex: Regex,
	handler: Handler<S>,
}

impl<S> std::fmt::Debug for Recognizer<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Recognizer")
			.field("pattern", &self.regex.as_str())
			.finish()
	}
}

impl<S> Recognizer<S> {
	/// Compile a recognizer. The pattern must have exactly one capture group.
	pub fn new(pattern: &str, handler: Handler<S>) -> Result<Self> {
		let regex = compile_regex(pattern)?;

		// captures_len() counts the implicit whole-match group
		let groups = regex.captures_len() - 1;
		if groups != 1 {
			return Err(VersionerError::InvalidCaptureCount {
				pattern: pattern.to_string(),
				groups,
			});
		}

		Ok(Recognizer { regex, handler })
	}

	/// The source pattern.
	pub fn pattern(&self) -> &str {
		self.regex.as_str()
	}

	/// Try to match `line`. Matching is done against the trimmed line and
	/// only counts when the match starts at its first character.
	pub fn try_match<'a>(&self, line: &'a [u8], index: usize) -> Option<LineMatch<'a>> {
		let trimmed_start = line.trim_ascii_start();
		let offset = line.len() - trimmed_start.len();
		let trimmed = trimmed_start.trim_ascii_end();

		let caps = self.regex.captures(trimmed)?;
		if caps.get(0)?.start() != 0 {
			return None;
		}
		let group = caps.get(1)?;
		let capture_range = (group.start() + offset)..(group.end() + offset);

		Some(LineMatch {
			line,
			index,
			capture: &line[capture_range.clone()],
			capture_range,
		})
	}
}

/// Compile a regex pattern string.
fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| VersionerError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

/// Find the first recognizer matching a line.
pub fn find_matching_recognizer<'r, 'a, S>(
	recognizers: &'r [Recognizer<S>],
	line: &'a [u8],
	index: usize,
) -> Option<(&'r Recognizer<S>, LineMatch<'a>)> {
	recognizers
		.iter()
		.find_map(|r| r.try_match(line, index).map(|m| (r, m)))
}

/// Process a single line: dispatch to the first matching recognizer and
/// return the line to emit.
pub fn process_line<S>(
	recognizers: &[Recognizer<S>],
	line: &[u8],
	index: usize,
	state: &mut S,
) -> Option<Vec<u8>> {
	let (recognizer, line_match) = find_matching_recognizer(recognizers, line, index)?;
	log::debug!(
		"line {} matched {}: captured {:?}",
		index,
		recognizer.pattern(),
		line_match.capture_lossy()
	);

	match (recognizer.handler)(state, &line_match) {
		LineAction::Replace(updated) if !updated.is_empty() => Some(updated),
		_ => None,
	}
}

/// Stream `reader` line by line through `recognizers`.
///
/// Every line keeps its own `\n` terminator and is handled as raw bytes,
/// so lines nobody rewrites are reproduced byte-for-byte whatever their
/// encoding. Handler side effects land in `state`.
pub fn scan<R: BufRead, S>(
	mut reader: R,
	recognizers: &[Recognizer<S>],
	state: &mut S,
) -> Result<Vec<u8>> {
	let mut output = Vec::new();
	let mut buf = Vec::new();

	for index in 0.. {
		buf.clear();
		let read = reader
			.read_until(b'\n', &mut buf)
			.map_err(|source| VersionerError::ReadError {
				line: index + 1,
				source,
			})?;
		if read == 0 {
			break;
		}

		let (line, terminated) = match buf.strip_suffix(b"\n") {
			Some(line) => (line, true),
			None => (buf.as_slice(), false),
		};

		match process_line(recognizers, line, index, state) {
			Some(updated) => output.extend_from_slice(&updated),
			None => output.extend_from_slice(line),
		}
		if terminated {
			output.push(b'\n');
		}
	}

	Ok(output)
}
