//! `Content-Disposition` header parsing (RFC 6266 with RFC 5987 ext-values).

use std::iter::Peekable;
use std::str::Chars;

use percent_encoding::percent_decode_str;

/// A parsed `Content-Disposition` value. Parameter names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    pub disposition: String,
    pub params: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Parses a header value. Returns `None` for an empty header.
    ///
    /// Parsing is lenient: a missing disposition type, stray separators and
    /// an unterminated quoted string are accepted.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        if header.is_empty() {
            return None;
        }

        let (disposition, rest) = match header.split_once(';') {
            Some((kind, rest)) if !kind.contains('=') => (kind.trim(), rest),
            None if !header.contains('=') => (header, ""),
            _ => ("", header),
        };

        Some(Self {
            disposition: disposition.to_ascii_lowercase(),
            params: parse_params(rest),
        })
    }

    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The suggested filename: `filename*` when it decodes, else `filename`.
    pub fn filename(&self) -> Option<String> {
        self.param("filename*")
            .and_then(decode_ext_value)
            .or_else(|| self.param("filename").map(ToOwned::to_owned))
            .filter(|name| !name.trim().is_empty())
    }
}

fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        skip_while(&mut chars, |c| c.is_whitespace() || c == ';');
        if chars.peek().is_none() {
            break;
        }

        let name = take_until(&mut chars, |c| c == '=' || c == ';');
        let name = name.trim().to_ascii_lowercase();
        if chars.next_if_eq(&'=').is_none() {
            // Bare word without a value.
            continue;
        }

        skip_while(&mut chars, char::is_whitespace);
        let value = if chars.next_if_eq(&'"').is_some() {
            let value = take_quoted(&mut chars);
            // Anything between the closing quote and the next separator is noise.
            take_until(&mut chars, |c| c == ';');
            value
        } else {
            take_until(&mut chars, |c| c == ';').trim().to_string()
        };

        if !name.is_empty() {
            params.push((name, value));
        }
    }

    params
}

fn skip_while(chars: &mut Peekable<Chars<'_>>, pred: impl Fn(char) -> bool) {
    while chars.next_if(|&c| pred(c)).is_some() {}
}

fn take_until(chars: &mut Peekable<Chars<'_>>, stop: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next_if(|&c| !stop(c)) {
        out.push(c);
    }
    out
}

/// Reads a quoted-string body after the opening quote, honouring backslash escapes.
fn take_quoted(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Decodes `charset'language'percent-encoded`. Only UTF-8 and ISO-8859-1 are understood.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?.trim();
    let _language = parts.next()?;
    let encoded = parts.next()?;
    let bytes: Vec<u8> = percent_decode_str(encoded).collect();

    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.into_iter().map(char::from).collect())
    } else {
        None
    }
}
