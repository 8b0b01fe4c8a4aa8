//! Escaping and name normalization.
//!
//! Everything here is a pure function over string slices. Text and attribute
//! values share one escaper: both `"` and `'` are escaped so the output is safe
//! inside either quoting style.

use crate::exception::StructureError;
use std::borrow::Cow;

/// Escapes HTML special characters in a string.
///
/// This function replaces the following characters:
/// - `&` → `&amp;`
/// - `<` → `&lt;`
/// - `>` → `&gt;`
/// - `"` → `&quot;`
/// - `'` → `&#x27;`
///
/// Returns a borrowed reference if no escaping is needed,
/// or an owned string if any characters were escaped.
///
/// # Examples
///
/// ```
/// use weft_core::escape::escape_html;
///
/// assert_eq!(escape_html("<b>hi</b>"), "&lt;b&gt;hi&lt;/b&gt;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(s: &str) -> Cow<'_, str> {
	if s.contains(['&', '<', '>', '"', '\'']) {
		let mut escaped = String::with_capacity(s.len() + 8);
		for c in s.chars() {
			match c {
				'&' => escaped.push_str("&amp;"),
				'<' => escaped.push_str("&lt;"),
				'>' => escaped.push_str("&gt;"),
				'"' => escaped.push_str("&quot;"),
				'\'' => escaped.push_str("&#x27;"),
				_ => escaped.push(c),
			}
		}
		Cow::Owned(escaped)
	} else {
		Cow::Borrowed(s)
	}
}

/// Escapes an attribute value. Same substitutions as [`escape_html`].
pub fn escape_attr(s: &str) -> Cow<'_, str> {
	escape_html(s)
}

/// Escapes JSON (or any script text) for safe embedding in a `<script>` element.
///
/// `</` becomes `<\/` and `<!--` becomes `<\!--`. JavaScript string literals
/// read both escapes back as the original characters, while the HTML parser no
/// longer sees a closing tag or a comment opener.
///
/// # Examples
///
/// ```
/// use weft_core::escape::escape_json_for_script;
///
/// assert_eq!(escape_json_for_script(r#""</script>""#), r#""<\/script>""#);
/// ```
pub fn escape_json_for_script(json: &str) -> String {
	json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Normalizes an attribute, property or tag name to lower kebab case.
///
/// An upper-case letter following a lower-case letter or digit starts a new
/// dash-separated segment (`backgroundColor` → `background-color`). `_` and
/// whitespace become `-`, runs of dashes collapse, and characters that cannot
/// appear in a name (quotes, `=`, `<`, `>`, `/`, ...) are dropped. A leading
/// `--` (CSS custom properties) is kept.
///
/// # Examples
///
/// ```
/// use weft_core::escape::to_kebab_case;
///
/// assert_eq!(to_kebab_case("backgroundColor"), "background-color");
/// assert_eq!(to_kebab_case("data_user_id"), "data-user-id");
/// assert_eq!(to_kebab_case("--mainColor"), "--main-color");
/// ```
pub fn to_kebab_case(name: &str) -> String {
	let trimmed = name.trim();
	let mut out = String::with_capacity(trimmed.len() + 4);

	let body = match trimmed.strip_prefix("--") {
		Some(rest) => {
			out.push_str("--");
			rest
		}
		None => trimmed,
	};

	let mut prev: Option<char> = None;
	for c in body.chars() {
		if c.is_ascii_uppercase() {
			let after_word =
				prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
			if after_word && !out.ends_with('-') {
				out.push('-');
			}
			out.push(c.to_ascii_lowercase());
		} else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' {
			out.push(c);
		} else if (c == '-' || c == '_' || c.is_whitespace())
			&& !out.is_empty()
			&& !out.ends_with('-')
		{
			out.push('-');
		}
		prev = Some(c);
	}

	if out.ends_with('-') && out != "--" {
		out.pop();
	}
	out
}

/// Normalizes and validates an element tag name.
///
/// The tag is kebab-normalized and must then match `[a-z][a-z0-9-]*`.
///
/// # Errors
///
/// Returns [`StructureError::EmptyTag`] for blank input and
/// [`StructureError::InvalidTag`] when the normalized name is not a valid
/// element name.
pub fn normalize_tag(tag: &str) -> Result<String, StructureError> {
	if tag.trim().is_empty() {
		return Err(StructureError::EmptyTag);
	}

	let normalized = to_kebab_case(tag);
	let mut chars = normalized.chars();
	let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
		&& chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

	if valid {
		Ok(normalized)
	} else {
		Err(StructureError::InvalidTag {
			tag: tag.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	fn test_escape_html_no_special_chars() {
		assert_eq!(escape_html("Hello World"), Cow::Borrowed("Hello World"));
	}

	#[rstest]
	#[case("a & b", "a &amp; b")]
	#[case("<div>", "&lt;div&gt;")]
	#[case("\"test\" 'value'", "&quot;test&quot; &#x27;value&#x27;")]
	fn test_escape_html_special_chars(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(escape_html(input), expected);
	}

	#[rstest]
	fn test_escape_json_for_script() {
		assert_eq!(escape_json_for_script("</script>"), "<\\/script>");
		assert_eq!(escape_json_for_script("<!-- x"), "<\\!-- x");
		assert_eq!(
			escape_json_for_script(r#"{"name":"test"}"#),
			r#"{"name":"test"}"#
		);
	}

	#[rstest]
	#[case("backgroundColor", "background-color")]
	#[case("fontSize", "font-size")]
	#[case("color", "color")]
	#[case("MyWidget", "my-widget")]
	#[case("aria_label", "aria-label")]
	#[case("on\"click", "onclick")]
	#[case("x=<y>", "xy")]
	#[case("--accentColor", "--accent-color")]
	#[case("xml:lang", "xml:lang")]
	fn test_to_kebab_case(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(to_kebab_case(input), expected);
	}

	#[rstest]
	#[case("div", "div")]
	#[case("DIV", "div")]
	#[case("myElement", "my-element")]
	#[case("h1", "h1")]
	fn test_normalize_tag_valid(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_tag(input).unwrap(), expected);
	}

	#[rstest]
	fn test_normalize_tag_rejects_empty() {
		assert_eq!(normalize_tag("  "), Err(StructureError::EmptyTag));
	}

	#[rstest]
	#[case("1div")]
	#[case("<>")]
	#[case("--x")]
	fn test_normalize_tag_rejects_invalid(#[case] input: &str) {
		assert!(matches!(
			normalize_tag(input),
			Err(StructureError::InvalidTag { .. })
		));
	}

	proptest! {
		/// Markup-significant characters never survive escaping.
		#[test]
		fn prop_escape_removes_markup_chars(input in ".*") {
			let escaped = escape_html(&input);
			prop_assert!(!escaped.contains('<'));
			prop_assert!(!escaped.contains('>'));
			prop_assert!(!escaped.contains('"'));
			prop_assert!(!escaped.contains('\''));
		}

		/// Every `&` in the output starts one of the five entities.
		#[test]
		fn prop_escape_ampersands_are_entities(input in ".*") {
			let escaped = escape_html(&input);
			for (idx, _) in escaped.match_indices('&') {
				let rest = &escaped[idx..];
				prop_assert!(
					rest.starts_with("&amp;")
						|| rest.starts_with("&lt;")
						|| rest.starts_with("&gt;")
						|| rest.starts_with("&quot;")
						|| rest.starts_with("&#x27;")
				);
			}
		}

		/// Kebab normalization never yields characters that break an attribute name.
		#[test]
		fn prop_kebab_is_name_safe(input in ".*") {
			let name = to_kebab_case(&input);
			prop_assert!(name.chars().all(|c| {
				c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == ':'
			}), "kebab name contains an unsafe character");
		}
	}
}
