//! Conservative HTML minification.
//!
//! Only clearly insignificant whitespace is touched: a run that contains a
//! newline or is longer than [`SHORT_RUN_MAX`] characters. Such a run is
//! removed when it sits between a closing `>` and an opening `<`, and
//! collapsed to a single space anywhere else. Shorter runs are kept as they
//! are, as is everything inside `pre`, `textarea`, `script` and `style`.
//! Tags are copied through whole, so attribute values never change.

/// Maximum input size for HTML minification (1 MiB).
///
/// Inputs exceeding this limit are returned unmodified.
pub const MINIFY_HTML_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Longest whitespace run (without a newline) that is left alone.
pub const SHORT_RUN_MAX: usize = 3;

const PRESERVED_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Minifies a rendered document.
///
/// # Examples
///
/// ```
/// use weft_pages::ssr::minify_html;
///
/// assert_eq!(minify_html("<ul>\n  <li>a  b</li>\n</ul>"), "<ul><li>a  b</li></ul>");
/// assert_eq!(minify_html("<p>one\n two</p>"), "<p>one two</p>");
/// assert_eq!(minify_html("<pre>\n  x\n</pre>"), "<pre>\n  x\n</pre>");
/// ```
pub fn minify_html(html: &str) -> String {
	if html.len() > MINIFY_HTML_MAX_INPUT_SIZE {
		return html.to_string();
	}

	// ASCII lowercasing keeps byte offsets aligned with `html`
	let lower = html.to_ascii_lowercase();
	let bytes = html.as_bytes();
	let mut result = String::with_capacity(html.len());
	let mut pos = 0;

	while pos < html.len() {
		let byte = bytes[pos];

		if byte == b'<' {
			if let Some(end) = preserved_block_end(&lower, pos) {
				result.push_str(&html[pos..end]);
				pos = end;
				continue;
			}
			if let Some(end) = tag_end(bytes, pos) {
				result.push_str(&html[pos..end]);
				pos = end;
				continue;
			}
		}

		if byte.is_ascii_whitespace() {
			let start = pos;
			while pos < html.len() && bytes[pos].is_ascii_whitespace() {
				pos += 1;
			}
			let run = &html[start..pos];

			if !run.contains('\n') && run.len() <= SHORT_RUN_MAX {
				result.push_str(run);
				continue;
			}

			let after_tag = result.is_empty() || result.ends_with('>');
			let before_tag = pos == html.len() || bytes[pos] == b'<';
			if !(after_tag && before_tag) {
				result.push(' ');
			}
			continue;
		}

		let Some(c) = html[pos..].chars().next() else {
			break;
		};
		result.push(c);
		pos += c.len_utf8();
	}

	result
}

/// If a tag opens at `start`, returns the offset just past its closing `>`
/// (or the end of input). Quoted attribute values may contain `>`, and a
/// comment runs to `-->`.
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
	let next = *bytes.get(start + 1)?;
	if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!') {
		return None;
	}

	let rest = &bytes[start..];
	if rest.starts_with(b"<!--") {
		let end = rest[4..]
			.windows(3)
			.position(|window| window == b"-->")
			.map_or(bytes.len(), |offset| start + 4 + offset + 3);
		return Some(end);
	}

	let mut quote = None;
	let mut after_equals = false;
	for (offset, &byte) in rest.iter().enumerate().skip(1) {
		match quote {
			Some(open) if byte == open => quote = None,
			Some(_) => {}
			None if after_equals && (byte == b'"' || byte == b'\'') => quote = Some(byte),
			None if byte == b'>' => return Some(start + offset + 1),
			None => {}
		}
		if !byte.is_ascii_whitespace() {
			after_equals = quote.is_none() && byte == b'=';
		}
	}
	Some(bytes.len())
}

/// If a preserved element opens at `start`, returns the offset just past its
/// closing tag (or the end of input when it is never closed).
fn preserved_block_end(lower: &str, start: usize) -> Option<usize> {
	let after_lt = &lower[start + 1..];
	let tag = PRESERVED_ELEMENTS.iter().find(|tag| {
		after_lt.strip_prefix(**tag).is_some_and(|rest| {
			rest.is_empty() || rest.starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace())
		})
	})?;

	let closing = format!("</{}", tag);
	let body_start = start + 1 + tag.len();
	let Some(offset) = lower[body_start..].find(&closing) else {
		return Some(lower.len());
	};
	let close_start = body_start + offset;
	let end = lower[close_start..]
		.find('>')
		.map_or(lower.len(), |gt| close_start + gt + 1);
	Some(end)
}
