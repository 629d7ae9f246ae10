//! Identifier helpers shared by the template parser and the type namer.

const DEFINITIONS_ROOT: &str = "#/definitions/";
const NESTED_DEFINITIONS: &str = "/definitions/";

/// Upper-case the first character of `s`, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Remove every char in `separators` and upper-case the char that follows it.
///
/// ```
/// use hyperschema_routes::to_upper_after_any;
///
/// assert_eq!(to_upper_after_any("spell-name", "-"), "spellName");
/// ```
pub fn to_upper_after_any(s: &str, separators: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if separators.contains(c) {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// CamelCase `s` on `.`, `-`, `_` and space boundaries.
///
/// ```
/// use hyperschema_routes::symbol_name;
///
/// assert_eq!(symbol_name("spells.one"), "SpellsOne");
/// assert_eq!(symbol_name("file-content_type"), "FileContentType");
/// ```
pub fn symbol_name(s: &str) -> String {
    capitalize(&to_upper_after_any(s, ".-_ "))
}

/// Hyphenated definition path of a ref.
///
/// The leading `#/definitions/` is stripped and nested `/definitions/` become `-`,
/// so `#/definitions/spell/definitions/name` gives `spell-name`. Relative refs
/// are returned as is.
pub fn definition_path(reference: &str) -> String {
    let stripped = match reference.find(DEFINITIONS_ROOT) {
        Some(idx) => {
            let mut s = String::with_capacity(reference.len());
            s.push_str(&reference[..idx]);
            s.push_str(&reference[idx + DEFINITIONS_ROOT.len()..]);
            s
        }
        None => reference.to_string(),
    };
    stripped.replace(NESTED_DEFINITIONS, "-")
}

/// Type name derived from a ref, e.g. `#/definitions/file/definitions/id` gives `FileId`.
pub fn type_name_from_ref(reference: &str) -> String {
    symbol_name(&definition_path(reference))
}

/// Identifier-safe variable name for a path parameter, e.g. `spell-name` gives `spellName`.
pub fn variable_name(param_name: &str) -> String {
    to_upper_after_any(param_name, "-")
}

/// Name of the handler function serving `method` on the route named `route_name`.
///
/// ```
/// use hyperschema_routes::handler_func_name;
///
/// assert_eq!(handler_func_name("GET", "spells.one"), "getSpellsOne");
/// ```
pub fn handler_func_name(method: &str, route_name: &str) -> String {
    format!("{}{}", method.to_lowercase(), symbol_name(route_name))
}
