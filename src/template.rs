//! Link `href` template parsing.
//!
//! Supports plain `{name}` substitution and the `{(pointer)}` operator, whose
//! content is a `$ref`-style JSON pointer that may contain reserved characters.
//! Anything else from RFC 6570 is not supported.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::ParseError;
use crate::naming::definition_path;

/// Characters kept verbatim when escaping the content of a `(...)` operator.
const VAR_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.');

/// Stand-in for an empty `()` operator. The `e` is percent-encoded so the token
/// can never collide with a variable literally named `empty`.
pub const EMPTY_VAR_TOKEN: &str = "%65mpty";

/// Route name segment used in place of every variable.
const NAME_VAR_TOKEN: &str = "one";

/// The views derived from a single `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefTemplate {
    /// Path with each variable rewritten as `{definition-path}`.
    pub path: String,
    /// Dotted route name, e.g. `spells.one`.
    pub name: String,
    /// Decoded variable contents, in order of appearance.
    pub variables: Vec<String>,
}

impl HrefTemplate {
    /// Build the path, route name and variables of `href`.
    pub fn parse(href: &str) -> Result<Self, ParseError> {
        let mut variables = Vec::new();
        let path = map_href_vars(href, |token| {
            let decoded = decode_var(href, token)?;
            let rendered = format!("{{{}}}", definition_path(&decoded));
            variables.push(decoded);
            Ok(rendered)
        })?;
        let name = route_name(href)?;
        Ok(Self {
            path,
            name,
            variables,
        })
    }
}

/// Returns the path and the decoded variables of `href`.
pub fn extract_path_and_variables(href: &str) -> Result<(String, Vec<String>), ParseError> {
    let template = HrefTemplate::parse(href)?;
    Ok((template.path, template.variables))
}

/// Path of `href`, e.g. `/spells/{(#/definitions/spell/definitions/name)}` gives
/// `/spells/{spell-name}`.
pub fn href_to_path(href: &str) -> Result<String, ParseError> {
    map_href_vars(href, |token| {
        Ok(format!("{{{}}}", definition_path(&decode_var(href, token)?)))
    })
}

/// Route name of `href`, e.g. `/spells/{id}` gives `spells.one`.
pub fn route_name(href: &str) -> Result<String, ParseError> {
    let name = map_href_vars(href, |_| Ok(NAME_VAR_TOKEN.to_string()))?;
    Ok(name.trim_start_matches('/').replace('/', "."))
}

/// Decoded content of every variable of `href`.
pub fn vars_from_href(href: &str) -> Result<Vec<String>, ParseError> {
    let mut vars = Vec::new();
    map_href_vars(href, |token| {
        vars.push(decode_var(href, token)?);
        Ok(String::new())
    })?;
    Ok(vars)
}

/// Runs `var_fn` on each pre-processed variable of `href` (braces excluded) and
/// substitutes its output in place of the `{...}` token.
fn map_href_vars<F>(href: &str, mut var_fn: F) -> Result<String, ParseError>
where
    F: FnMut(&str) -> Result<String, ParseError>,
{
    let mut out = String::with_capacity(href.len());
    let mut var = String::new();
    let mut in_var = false;

    for c in href.chars() {
        match c {
            '{' => {
                if in_var {
                    return Err(malformed(href, "found opening { while already in a var"));
                }
                in_var = true;
            }
            '}' => {
                if !in_var {
                    return Err(malformed(href, "found closing } while not in a var"));
                }
                in_var = false;
                let token = preprocess_var(&var);
                var.clear();
                out.push_str(&var_fn(&token)?);
            }
            _ if in_var => var.push(c),
            _ => out.push(c),
        }
    }
    if in_var {
        return Err(malformed(href, "unterminated var"));
    }
    Ok(out)
}

/// Percent-encode the content of `(...)` operators in a raw variable.
///
/// A doubled `))` inside an operator stands for a literal `)`.
pub fn preprocess_var(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = String::new();
    let mut in_escape = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' if !in_escape => in_escape = true,
            ')' => {
                if chars.peek() == Some(&')') {
                    chars.next();
                    escaped.push(')');
                    continue;
                }
                in_escape = false;
                let encoded = utf8_percent_encode(&escaped, VAR_ESCAPE).to_string();
                escaped.clear();
                if encoded.is_empty() {
                    out.push_str(EMPTY_VAR_TOKEN);
                } else {
                    out.push_str(&encoded);
                }
            }
            _ if in_escape => escaped.push(c),
            _ => out.push(c),
        }
    }
    out
}

fn decode_var(href: &str, token: &str) -> Result<String, ParseError> {
    unescape_pct(token).map_err(|message| malformed(href, &message))
}

/// Strict percent-decoding: rejects non-ASCII input and truncated or non-hex escapes.
pub fn unescape_pct(s: &str) -> Result<String, String> {
    if !s.is_ascii() {
        return Err("non-ASCII char detected".to_string());
    }
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
                Some(_) => {
                    return Err(format!("invalid escape sequence at offset {} in {:?}", i, s))
                }
                None => return Err("unexpected end of escape sequence".to_string()),
            }
        } else {
            i += 1;
        }
    }
    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("escape sequence is not UTF-8: {}", e))
}

fn malformed(href: &str, message: &str) -> ParseError {
    ParseError::MalformedTemplate {
        href: href.to_string(),
        message: message.to_string(),
    }
}
