//! Placeholder templates with legacy `&`-style color codes.
//!
//! Message layouts come from configuration as plain strings such as
//! `"{prefix} &b{username} &8┃ &f{mitigation}"`. A [`Template`] substitutes the
//! `{placeholders}`, then either translates `&x` codes to the `§x` section sign
//! the client understands, or strips them for console output.

/// Section sign used by the client for legacy formatting codes.
pub const SECTION_SIGN: char = '§';

const FORMAT_CODES: &str = "0123456789abcdefklmnorABCDEFKLMNOR";

/// An owned message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    /// Wraps a raw layout string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Replaces every occurrence of `placeholder` with `value`.
    #[must_use]
    pub fn replace(self, placeholder: &str, value: impl AsRef<str>) -> Self {
        if !self.0.contains(placeholder) {
            return self;
        }
        Self(self.0.replace(placeholder, value.as_ref()))
    }

    /// Replaces `{prefix}` with the given prefix and `{n}` with line breaks.
    #[must_use]
    pub fn replace_prefix(self, prefix: &str) -> Self {
        self.replace("{prefix}", prefix).replace("{n}", "\n")
    }

    /// Translates `&x` codes into `§x`.
    #[must_use]
    pub fn colorize(self) -> Self {
        Self(translate_codes(&self.0, Some(SECTION_SIGN)))
    }

    /// Removes `&x` and `§x` codes entirely.
    #[must_use]
    pub fn strip(self) -> Self {
        let stripped = translate_codes(&self.0, None);
        Self(translate_codes_with(&stripped, SECTION_SIGN, None))
    }

    /// The rendered message.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Borrows the rendered message.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.0
    }
}

fn translate_codes(input: &str, replacement: Option<char>) -> String {
    translate_codes_with(input, '&', replacement)
}

fn translate_codes_with(input: &str, marker: char, replacement: Option<char>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == marker
            && let Some(&code) = chars.peek()
            && FORMAT_CODES.contains(code)
        {
            chars.next();
            if let Some(replacement) = replacement {
                out.push(replacement);
                out.push(code.to_ascii_lowercase());
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Truncates `input` to at most `max_chars` characters, appending `...` when cut.
#[must_use]
pub fn shorten(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_placeholders() {
        let msg = Template::new("&b{username} &8| x{violations}")
            .replace("{username}", "Notch")
            .replace("{violations}", "3")
            .colorize()
            .into_string();
        assert_eq!(msg, "§bNotch §8| x3");
    }

    #[test]
    fn strip_removes_both_code_styles() {
        let msg = Template::new("&7Hello §cworld & friends").strip();
        assert_eq!(msg.as_str(), "Hello world & friends");
    }

    #[test]
    fn prefix_and_newlines() {
        let msg = Template::new("{prefix} a{n}b").replace_prefix("[W]");
        assert_eq!(msg.as_str(), "[W] a\nb");
    }

    #[test]
    fn shorten_respects_char_boundaries() {
        assert_eq!(shorten("abc", 5), "abc");
        assert_eq!(shorten("abcdef", 3), "abc...");
        assert_eq!(shorten("┃┃┃┃", 2), "┃┃...");
    }
}
