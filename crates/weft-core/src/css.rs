//! Scoped CSS generation.
//!
//! A style map becomes a rule list (`prop:value;...`), the rule list is hashed
//! with 32-bit FNV-1a, and the hash names a class. Equal rule lists always
//! produce the same class, so nodes sharing a style share one CSS rule.

use crate::escape::to_kebab_case;

/// Default maximum length (in characters) of a sanitized CSS value.
pub const DEFAULT_CSS_VALUE_MAX_LEN: usize = 200;

/// Prefix of every generated scoped class name.
pub const SCOPED_CLASS_PREFIX: &str = "w-";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A scoped class together with the rule list it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedStyle {
	/// The generated class name.
	pub class: String,
	/// The `prop:value;` rule list.
	pub rules: String,
}

impl ScopedStyle {
	/// Returns the CSS fragment `.class{rules}`.
	pub fn fragment(&self) -> String {
		format!(".{}{{{}}}", self.class, self.rules)
	}
}

/// Normalizes a CSS property name to kebab case.
pub fn normalize_property(name: &str) -> String {
	to_kebab_case(name)
}

/// Sanitizes a CSS value.
///
/// Characters that could terminate a declaration or a rule (`;`, `{`, `}`),
/// open markup (`<`, `>`) or start an escape (`\`) are stripped, comment
/// delimiters (`/*`, `*/`) are removed, and the result is trimmed and
/// truncated to `max_len` characters.
///
/// # Examples
///
/// ```
/// use weft_core::css::sanitize_value;
///
/// assert_eq!(sanitize_value("red;}body{color:blue", 200), "redbodycolor:blue");
/// assert_eq!(sanitize_value("1px /* x */ solid", 200), "1px  x  solid");
/// ```
pub fn sanitize_value(value: &str, max_len: usize) -> String {
	let mut stripped: String = value
		.chars()
		.filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '\\'))
		.collect();

	while stripped.contains("/*") || stripped.contains("*/") {
		stripped = stripped.replace("/*", "").replace("*/", "");
	}

	stripped.trim().chars().take(max_len).collect()
}

/// 32-bit FNV-1a hash of a string.
pub fn hash32(input: &str) -> u32 {
	input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
		(hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
	})
}

/// Derives the scoped class name for a rule list.
///
/// # Examples
///
/// ```
/// use weft_core::css::scoped_class;
///
/// assert_eq!(scoped_class("color:red;"), scoped_class("color:red;"));
/// assert_ne!(scoped_class("color:red;"), scoped_class("color:blue;"));
/// assert!(scoped_class("color:red;").starts_with("w-"));
/// ```
pub fn scoped_class(rules: &str) -> String {
	format!("{}{}", SCOPED_CLASS_PREFIX, to_base36(hash32(rules)))
}

/// Builds a scoped style from ordered declarations.
///
/// Property names are kebab-normalized and values sanitized. Declarations
/// whose name or sanitized value is empty are skipped. Returns `None` when no
/// declaration survives.
pub fn scope_declarations<I, K, V>(declarations: I, max_value_len: usize) -> Option<ScopedStyle>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut rules = String::new();
	for (name, value) in declarations {
		let property = normalize_property(name.as_ref());
		let value = sanitize_value(value.as_ref(), max_value_len);
		if property.is_empty() || value.is_empty() {
			continue;
		}
		rules.push_str(&property);
		rules.push(':');
		rules.push_str(&value);
		rules.push(';');
	}

	if rules.is_empty() {
		return None;
	}

	Some(ScopedStyle {
		class: scoped_class(&rules),
		rules,
	})
}

/// Rebuilds a `.class{rules}` fragment from untrusted input.
///
/// Each rule is kept only when its selector is a single plain class name.
/// Declarations are re-normalized and their values sanitized again, so the
/// result can be emitted inside a `<style>` element. Anything between or
/// after rules is dropped.
///
/// # Examples
///
/// ```
/// use weft_core::css::sanitize_fragment;
///
/// assert_eq!(sanitize_fragment(".w-1{color:red;}", 200), ".w-1{color:red;}");
/// assert_eq!(sanitize_fragment(".x{}</style><script>", 200), "");
/// ```
pub fn sanitize_fragment(fragment: &str, max_value_len: usize) -> String {
	let mut output = String::new();
	let mut rest = fragment;

	while let Some(open) = rest.find('{') {
		let Some(len) = rest[open..].find('}') else {
			break;
		};
		let selector = rest[..open].trim();
		let body = &rest[open + 1..open + len];
		rest = &rest[open + len + 1..];

		let Some(class) = selector.strip_prefix('.').filter(|class| is_class_name(class)) else {
			continue;
		};
		let declarations = body
			.split(';')
			.filter_map(|declaration| declaration.split_once(':'));
		if let Some(style) = scope_declarations(declarations, max_value_len) {
			output.push('.');
			output.push_str(class);
			output.push('{');
			output.push_str(&style.rules);
			output.push('}');
		}
	}

	output
}

fn is_class_name(name: &str) -> bool {
	!name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

fn to_base36(mut n: u32) -> String {
	const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
	if n == 0 {
		return "0".to_string();
	}
	let mut buf = Vec::with_capacity(7);
	while n > 0 {
		buf.push(DIGITS[(n % 36) as usize]);
		n /= 36;
	}
	buf.reverse();
	String::from_utf8_lossy(&buf).into_owned()
}
