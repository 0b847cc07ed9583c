//! Proto name → Rust name conversion, matching what prost generates.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Strict and reserved keywords that prost turns into raw identifiers
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers; prost appends an underscore
const SUFFIXED_KEYWORDS: &[&str] = &["crate", "extern", "self", "super", "Self"];

fn escape(ident: String) -> String {
    if RAW_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{}", ident)
    } else if SUFFIXED_KEYWORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Identifier prost uses for a struct field
pub fn field_ident(name: &str) -> String {
    escape(name.to_snake_case())
}

/// Identifier prost uses for a message struct
pub fn type_ident(name: &str) -> String {
    escape(name.to_upper_camel_case())
}

/// Identifier prost uses for the module holding a message's nested types
pub fn module_ident(name: &str) -> String {
    escape(name.to_snake_case())
}

/// Path of a message struct relative to its package module.
///
/// `full_name` is the fully-qualified proto name; `package` is stripped from
/// it and every enclosing message becomes a module.
pub fn message_path(full_name: &str, package: &str) -> String {
    let relative = if package.is_empty() {
        full_name
    } else {
        full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name)
    };

    let segments: Vec<&str> = relative.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return String::new();
    };

    let mut path: Vec<String> = parents.iter().map(|p| module_ident(p)).collect();
    path.push(type_ident(last));
    path.join("::")
}

/// Output file stem for a package, following prost's `_` convention
pub fn package_file_stem(package: &str) -> &str {
    if package.is_empty() {
        "_"
    } else {
        package
    }
}
