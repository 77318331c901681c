//! Identifier and C-type-spelling helpers shared across the type engine and
//! the member/interface code generators.

/// Convert a D-Bus member name (`"TestArrayInt"`) into the snake_case form
/// used for externally-visible C symbols (`"test_array_int"`).
///
/// An underscore is inserted at every lower/digit-to-upper boundary, and the
/// whole result is lowercased. Mirrors the original tool's
/// `NAME_RE = ([a-z0-9])([A-Z])` substitution.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if let Some(p) = prev {
            if (p.is_ascii_lowercase() || p.is_ascii_digit()) && c.is_ascii_uppercase() {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

/// Turn a C type spelling into a pointer to that type (`"int"` -> `"int *"`,
/// `"char *"` -> `"char **"`).
pub fn pointerify(c_type: &str) -> String {
    if c_type.ends_with('*') {
        format!("{c_type}*")
    } else {
        format!("{c_type} *")
    }
}

/// Turn a C pointer type spelling into a const pointer
/// (`"char *"` -> `"const char *"`, `"char **"` -> `"char * const *"`).
/// Non-pointer types are returned unchanged (there is no mutation to guard).
pub fn constify(c_type: &str) -> String {
    if !c_type.ends_with('*') {
        return c_type.to_string();
    }
    let without_last = &c_type[..c_type.len() - 1];
    if without_last.trim_end().ends_with('*') {
        format!("{without_last} const *")
    } else {
        format!("const {c_type}")
    }
}

/// Apply the `pointer`/`const` modifiers used throughout the type engine to
/// a bare C type spelling.
pub fn modify_type(c_type: &str, pointer: bool, const_: bool) -> String {
    let mut t = c_type.to_string();
    if pointer {
        t = pointerify(&t);
    }
    if const_ {
        t = constify(&t);
    }
    t
}

/// Indent every non-blank line of `text` by `level` tabs.
pub fn indent(text: &str, level: usize) -> String {
    let prefix = "\t".repeat(level);
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(line);
        } else {
            out.push_str(&prefix);
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_conversion() {
        assert_eq!(camel_to_snake("Ping"), "ping");
        assert_eq!(camel_to_snake("TestArrayInt"), "test_array_int");
        assert_eq!(camel_to_snake("TestInt32"), "test_int32");
        assert_eq!(camel_to_snake("GetCPUInfo"), "get_cpuinfo");
    }

    #[test]
    fn pointer_and_const_modifiers() {
        assert_eq!(pointerify("int32_t"), "int32_t *");
        assert_eq!(pointerify("char *"), "char **");
        assert_eq!(constify("char *"), "const char *");
        assert_eq!(constify("char **"), "char * const *");
        assert_eq!(constify("int32_t"), "int32_t");
    }

    #[test]
    fn indent_skips_blank_lines() {
        let src = "a;\n\nb;\n";
        assert_eq!(indent(src, 1), "\ta;\n\n\tb;\n");
    }
}
