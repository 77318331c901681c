//! The type-driven marshal/dispatch engine (TypeKind catalog + type node).
//!
//! `TypeKind` is the closed catalog of D-Bus wire types this engine knows
//! (§4.A). `TypeNode` binds a `TypeKind` to a variable name and exposes the
//! five pure queries every shape must answer — `signature`, `vars`,
//! `locals`, `marshal`, `dispatch` (§4.B) — which is the core contract the
//! rest of the generator is built on.

use crate::error::{CodegenError, Result};
use crate::naming::{indent, modify_type};
use std::fmt::Write as _;

/// Direction of an argument: which way it crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// The closed set of D-Bus types this engine understands.
///
/// `variant`, `struct`, and `dict-entry` are intentionally absent — they are
/// rejected by [`TypeKind::parse`] rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Byte,
    Bool,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array(Box<TypeKind>),
}

impl TypeKind {
    /// Parse a complete D-Bus signature (e.g. `"ai"`, `"s"`, `"aas"`) into a
    /// single `TypeKind`. The whole string must be consumed by exactly one
    /// type; trailing characters are an error (argument signatures name one
    /// type each).
    pub fn parse(sig: &str) -> Result<TypeKind> {
        let mut chars = sig.chars().peekable();
        let kind = Self::parse_one(&mut chars, sig)?;
        if chars.peek().is_some() {
            return Err(CodegenError::UnknownSignature(sig.to_string()));
        }
        Ok(kind)
    }

    fn parse_one(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, whole: &str) -> Result<TypeKind> {
        let c = chars
            .next()
            .ok_or_else(|| CodegenError::UnknownSignature(whole.to_string()))?;
        let kind = match c {
            'y' => TypeKind::Byte,
            'b' => TypeKind::Bool,
            'n' => TypeKind::Int16,
            'q' => TypeKind::UInt16,
            'i' => TypeKind::Int32,
            'u' => TypeKind::UInt32,
            'x' => TypeKind::Int64,
            't' => TypeKind::UInt64,
            'd' => TypeKind::Double,
            's' => TypeKind::String,
            'o' => TypeKind::ObjectPath,
            'g' => TypeKind::Signature,
            'a' => {
                let elem = Self::parse_one(chars, whole)?;
                TypeKind::Array(Box::new(elem))
            }
            'v' => {
                return Err(CodegenError::UnsupportedContainer {
                    signature: whole.to_string(),
                    kind: "variant",
                });
            }
            '(' | ')' => {
                return Err(CodegenError::UnsupportedContainer {
                    signature: whole.to_string(),
                    kind: "struct",
                });
            }
            '{' | '}' => {
                return Err(CodegenError::UnsupportedContainer {
                    signature: whole.to_string(),
                    kind: "dict-entry",
                });
            }
            _ => return Err(CodegenError::UnknownSignature(whole.to_string())),
        };
        Ok(kind)
    }

    /// D-Bus wire signature for this kind alone (a deterministic function of
    /// the kind, independent of pointer/const modifiers).
    pub fn wire_signature(&self) -> String {
        match self {
            TypeKind::Byte => "y".into(),
            TypeKind::Bool => "b".into(),
            TypeKind::Int16 => "n".into(),
            TypeKind::UInt16 => "q".into(),
            TypeKind::Int32 => "i".into(),
            TypeKind::UInt32 => "u".into(),
            TypeKind::Int64 => "x".into(),
            TypeKind::UInt64 => "t".into(),
            TypeKind::Double => "d".into(),
            TypeKind::String => "s".into(),
            TypeKind::ObjectPath => "o".into(),
            TypeKind::Signature => "g".into(),
            TypeKind::Array(elem) => format!("a{}", elem.wire_signature()),
        }
    }

    /// The `DBUS_TYPE_*` wire-enum identifier emitted into generated code.
    pub fn wire_enum(&self) -> &'static str {
        match self {
            TypeKind::Byte => "DBUS_TYPE_BYTE",
            TypeKind::Bool => "DBUS_TYPE_BOOLEAN",
            TypeKind::Int16 => "DBUS_TYPE_INT16",
            TypeKind::UInt16 => "DBUS_TYPE_UINT16",
            TypeKind::Int32 => "DBUS_TYPE_INT32",
            TypeKind::UInt32 => "DBUS_TYPE_UINT32",
            TypeKind::Int64 => "DBUS_TYPE_INT64",
            TypeKind::UInt64 => "DBUS_TYPE_UINT64",
            TypeKind::Double => "DBUS_TYPE_DOUBLE",
            TypeKind::String => "DBUS_TYPE_STRING",
            TypeKind::ObjectPath => "DBUS_TYPE_OBJECT_PATH",
            TypeKind::Signature => "DBUS_TYPE_SIGNATURE",
            TypeKind::Array(_) => "DBUS_TYPE_ARRAY",
        }
    }

    /// The unmodified (no pointer/const applied) native C type spelling.
    pub fn native_type(&self) -> String {
        match self {
            TypeKind::Byte => "uint8_t".into(),
            TypeKind::Bool => "int".into(),
            TypeKind::Int16 => "int16_t".into(),
            TypeKind::UInt16 => "uint16_t".into(),
            TypeKind::Int32 => "int32_t".into(),
            TypeKind::UInt32 => "uint32_t".into(),
            TypeKind::Int64 => "int64_t".into(),
            TypeKind::UInt64 => "uint64_t".into(),
            TypeKind::Double => "double".into(),
            TypeKind::String | TypeKind::ObjectPath | TypeKind::Signature => "char *".into(),
            TypeKind::Array(elem) => crate::naming::pointerify(&elem.native_type()),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeKind::Array(_))
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, TypeKind::String | TypeKind::ObjectPath | TypeKind::Signature)
    }

    /// Whether a value of this type is NUL-terminable — string-likes and
    /// arrays are (their native type is already a pointer); scalars are not.
    pub fn is_pointer_typed(&self) -> bool {
        self.is_string_like() || self.is_array()
    }

    /// Number of `(type, name)` pairs an unnamed instance of this kind would
    /// occupy in `vars()` — used to enforce the single-variable-element
    /// invariant on arrays without needing a name yet.
    fn vars_arity(&self) -> usize {
        match self {
            TypeKind::Array(elem) => {
                if elem.is_pointer_typed() {
                    1
                } else {
                    2
                }
            }
            _ => 1,
        }
    }

    /// Reject arrays whose element needs more than one variable (the length
    /// field would be lost), recursively. Called once per array node at
    /// construction, never at emission time.
    fn validate(&self) -> Result<()> {
        if let TypeKind::Array(elem) = self {
            if elem.vars_arity() != 1 {
                return Err(CodegenError::MultiVariableElement {
                    array_signature: self.wire_signature(),
                });
            }
            elem.validate()?;
        }
        Ok(())
    }
}

/// A `TypeKind` bound to a variable name (and, for arguments, a direction).
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub name: String,
    pub direction: Option<Direction>,
}

impl TypeNode {
    /// Construct a type node, rejecting array/element shapes the engine
    /// can't represent (§3 invariants, §8 property 5).
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Result<TypeNode> {
        kind.validate()?;
        Ok(TypeNode {
            kind,
            name: name.into(),
            direction: None,
        })
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Parse `(name, signature, direction)` straight from an `<arg>`
    /// element's attributes.
    pub fn from_arg(name: &str, signature: &str, direction: Direction) -> Result<TypeNode> {
        let kind = TypeKind::parse(signature)?;
        Ok(TypeNode::new(kind, name)?.with_direction(direction))
    }

    fn name_ref(&self, pointer: bool) -> String {
        if pointer { format!("*{}", self.name) } else { self.name.clone() }
    }

    /// Array element helper: a node for `<name>_elem` at the kind one level
    /// down, never itself array-arity-invalid (already checked by `new`).
    fn element_node(&self) -> TypeNode {
        match &self.kind {
            TypeKind::Array(elem) => TypeNode {
                kind: (**elem).clone(),
                name: format!("{}_elem", self.name),
                direction: None,
            },
            _ => unreachable!("element_node called on non-array kind"),
        }
    }

    fn len_name(&self) -> String {
        format!("{}_len", self.name)
    }

    fn iter_name(&self) -> String {
        format!("{}_iter", self.name)
    }

    fn value_name(&self) -> String {
        format!("{}_value", self.name)
    }

    fn loop_name(&self) -> String {
        format!("{}_p", self.name)
    }

    /// D-Bus wire signature (pointer/const modifiers never affect this).
    pub fn signature(&self) -> String {
        self.kind.wire_signature()
    }

    /// Variables the caller's code must declare to hold this value.
    pub fn vars(&self, pointer: bool, const_: bool) -> Vec<(String, String)> {
        match &self.kind {
            TypeKind::Array(_) => {
                let elem = self.element_node();
                let elem_c_type = crate::naming::pointerify(&elem.kind.native_type());
                let mut vars = vec![(modify_type(&elem_c_type, pointer, const_), self.name.clone())];
                if !elem.kind.is_pointer_typed() {
                    vars.push((modify_type("size_t", pointer, const_), self.len_name()));
                }
                vars
            }
            _ => vec![(modify_type(&self.kind.native_type(), pointer, const_), self.name.clone())],
        }
    }

    /// Locals the engine needs inside a marshal/dispatch block (only the
    /// `const` modifier ever applies here — locals are never pointers to
    /// themselves).
    pub fn locals(&self, const_: bool) -> Vec<(String, String)> {
        match &self.kind {
            TypeKind::Array(_) => {
                let elem = self.element_node();
                let mut locals = vec![("DBusMessageIter".to_string(), self.iter_name())];
                if elem.kind.is_pointer_typed() {
                    locals.push(("size_t".to_string(), self.len_name()));
                }
                locals
            }
            k if k.is_string_like() => {
                vec![(modify_type("char *", false, const_), self.value_name())]
            }
            _ => vec![],
        }
    }

    /// Read a value of this type off `iter_name` into `vars()`, branching to
    /// `type_error`/`mem_error` on failure, then advance the iterator.
    pub fn marshal(
        &self,
        iter_name: &str,
        parent: &str,
        type_error: &str,
        mem_error: &str,
        pointer: bool,
        const_: bool,
    ) -> String {
        match &self.kind {
            TypeKind::Array(_) => self.marshal_array(iter_name, parent, type_error, mem_error, pointer, const_),
            k if k.is_string_like() => self.marshal_string(iter_name, parent, type_error, mem_error, pointer),
            _ => self.marshal_scalar(iter_name, type_error, pointer),
        }
    }

    /// Write `vars()` onto `iter_name`, branching to `mem_error` on
    /// allocation/append failure.
    pub fn dispatch(&self, iter_name: &str, mem_error: &str, pointer: bool, const_: bool) -> String {
        match &self.kind {
            TypeKind::Array(_) => self.dispatch_array(iter_name, mem_error, pointer, const_),
            k if k.is_string_like() => self.dispatch_string(iter_name, mem_error, pointer),
            _ => self.dispatch_scalar(iter_name, mem_error, pointer),
        }
    }

    fn marshal_scalar(&self, iter_name: &str, type_error: &str, pointer: bool) -> String {
        let name = self.name_ref(pointer);
        format!(
            "if (dbus_message_iter_get_arg_type (&{iter}) != {wire}) {{\n{terr}\n}}\n\n\
             dbus_message_iter_get_basic (&{iter}, &{name});\n\n\
             dbus_message_iter_next (&{iter});\n",
            iter = iter_name,
            wire = self.kind.wire_enum(),
            terr = type_error,
            name = name,
        )
    }

    fn dispatch_scalar(&self, iter_name: &str, mem_error: &str, pointer: bool) -> String {
        let name = self.name_ref(pointer);
        format!(
            "if (! dbus_message_iter_append_basic (&{iter}, {wire}, &{name})) {{\n{merr}\n}}\n",
            iter = iter_name,
            wire = self.kind.wire_enum(),
            merr = mem_error,
            name = name,
        )
    }

    fn marshal_string(&self, iter_name: &str, parent: &str, type_error: &str, mem_error: &str, pointer: bool) -> String {
        let name = self.name_ref(pointer);
        let value_name = self.value_name();
        format!(
            "if (dbus_message_iter_get_arg_type (&{iter}) != {wire}) {{\n{terr}\n}}\n\n\
             dbus_message_iter_get_basic (&{iter}, &{value});\n\n\
             {name} = nih_strdup ({parent}, {value});\n\
             if (! {name}) {{\n{merr}\n}}\n\n\
             dbus_message_iter_next (&{iter});\n",
            iter = iter_name,
            wire = self.kind.wire_enum(),
            terr = type_error,
            value = value_name,
            parent = parent,
            merr = mem_error,
            name = name,
        )
    }

    fn dispatch_string(&self, iter_name: &str, mem_error: &str, pointer: bool) -> String {
        let name = self.name_ref(pointer);
        let value_name = self.value_name();
        format!(
            "{value} = {name};\n\
             if (! dbus_message_iter_append_basic (&{iter}, {wire}, &{value})) {{\n{merr}\n}}\n",
            value = value_name,
            name = name,
            iter = iter_name,
            wire = self.kind.wire_enum(),
            merr = mem_error,
        )
    }

    fn marshal_array(
        &self,
        iter_name: &str,
        parent: &str,
        type_error: &str,
        mem_error: &str,
        pointer: bool,
        _const: bool,
    ) -> String {
        let elem = self.element_node();
        let elem_pointer_typed = elem.kind.is_pointer_typed();
        let name = self.name_ref(pointer);
        let len_name = if pointer && !elem_pointer_typed {
            format!("*{}", self.len_name())
        } else {
            self.len_name()
        };
        let elem_c_type = crate::naming::pointerify(&elem.kind.native_type());

        let mut code = String::new();
        let _ = write!(
            code,
            "if (dbus_message_iter_get_arg_type (&{iter}) != DBUS_TYPE_ARRAY) {{\n{terr}\n}}\n\n\
             if (dbus_message_iter_get_element_type (&{iter}) != {elem_wire}) {{\n{terr}\n}}\n\n\
             dbus_message_iter_recurse (&{iter}, &{sub_iter});\n\n\
             {name} = NULL;\n\
             {len_name} = 0;\n\n\
             while (dbus_message_iter_get_arg_type (&{sub_iter}) != DBUS_TYPE_INVALID) {{\n",
            iter = iter_name,
            terr = type_error,
            elem_wire = elem.kind.wire_enum(),
            sub_iter = self.iter_name(),
            name = name,
            len_name = len_name,
        );

        let mut decls = elem.vars(false, false);
        decls.extend(elem.locals(false));
        let mut body = String::new();
        for (ty, nm) in &decls {
            let _ = writeln!(body, "{ty} {nm};");
        }
        body.push('\n');
        body.push_str(&elem.marshal(&self.iter_name(), parent, type_error, mem_error, false, false));
        body.push('\n');
        let _ = write!(
            body,
            "{name} = nih_realloc ({name}, {parent}, sizeof ({elem_c_type}) * (({len_name}) + 1));\n\
             if (! {name}) {{\n{merr}\n}}\n\n\
             ({name})[({len_name})++] = {elem_name};\n",
            name = name,
            parent = parent,
            elem_c_type = elem_c_type,
            len_name = len_name,
            merr = mem_error,
            elem_name = elem.name,
        );
        code.push_str(&indent(&body, 1));

        let _ = write!(code, "}}\n\ndbus_message_iter_next (&{iter});\n", iter = iter_name);

        if elem_pointer_typed {
            let _ = write!(
                code,
                "\n{name} = nih_realloc ({name}, {parent}, sizeof ({elem_c_type}) * (({len_name}) + 1));\n\
                 if (! {name}) {{\n{merr}\n}}\n\n\
                 ({name})[({len_name})] = NULL;\n",
                name = name,
                parent = parent,
                elem_c_type = elem_c_type,
                len_name = len_name,
                merr = mem_error,
            );
        }

        code
    }

    fn dispatch_array(&self, iter_name: &str, mem_error: &str, pointer: bool, const_: bool) -> String {
        let elem = self.element_node();
        let elem_pointer_typed = elem.kind.is_pointer_typed();
        let name = self.name_ref(pointer);
        let len_name = if pointer && !elem_pointer_typed {
            format!("*{}", self.len_name())
        } else {
            self.len_name()
        };
        let loop_name = self.loop_name();
        let loop_type = modify_type(&crate::naming::pointerify(&elem.kind.native_type()), false, const_);

        let mut code = String::new();
        let _ = write!(
            code,
            "if (! dbus_message_iter_open_container (&{iter}, {wire}, \"{elem_sig}\", &{sub_iter})) {{\n{merr}\n}}\n\n",
            iter = iter_name,
            wire = self.kind.wire_enum(),
            elem_sig = elem.signature(),
            sub_iter = self.iter_name(),
            merr = mem_error,
        );

        if elem_pointer_typed {
            let _ = write!(
                code,
                "{len_name} = 0;\n\
                 for ({ty}{loop} = {name}; {loop} && *{loop}; {loop}++) {{\n",
                len_name = len_name,
                ty = loop_type,
                loop = loop_name,
                name = name,
            );
        } else {
            let _ = write!(
                code,
                "for ({ty}{loop} = {name}; {loop} < {name} + {len_name}; {loop}++) {{\n",
                ty = loop_type,
                loop = loop_name,
                name = name,
                len_name = len_name,
            );
        }

        let mut decls = elem.vars(false, false);
        decls.extend(elem.locals(false));
        let mut body = String::new();
        for (ty, nm) in &decls {
            let _ = writeln!(body, "{ty} {nm};");
        }
        body.push('\n');
        let _ = writeln!(body, "{} = *{};", elem.name, loop_name);
        body.push('\n');
        body.push_str(&elem.dispatch(&self.iter_name(), mem_error, false, false));
        if elem_pointer_typed {
            let _ = writeln!(body, "\n({})++;", len_name);
        }
        code.push_str(&indent(&body, 1));

        let _ = write!(
            code,
            "}}\n\nif (! dbus_message_iter_close_container (&{iter}, &{sub_iter})) {{\n{merr}\n}}\n",
            iter = iter_name,
            sub_iter = self.iter_name(),
            merr = mem_error,
        );

        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(sig: &str, name: &str) -> TypeNode {
        TypeNode::new(TypeKind::parse(sig).unwrap(), name).unwrap()
    }

    #[test]
    fn signature_round_trip() {
        for sig in ["y", "b", "n", "q", "i", "u", "x", "t", "d", "s", "o", "g", "ai", "as", "aai".trim()] {
            if sig == "aai" {
                // covered separately: nested array of scalar is rejected, not round-tripped
                continue;
            }
            let kind = TypeKind::parse(sig).unwrap();
            assert_eq!(kind.wire_signature(), sig);
        }
    }

    #[test]
    fn variable_arity_scalars_and_strings() {
        assert_eq!(node("i", "a").vars(false, false).len(), 1);
        assert_eq!(node("s", "a").vars(false, false).len(), 1);
        assert_eq!(node("o", "a").vars(false, false).len(), 1);
    }

    #[test]
    fn variable_arity_arrays() {
        // array of int: not pointer-typed element -> pointer + length
        assert_eq!(node("ai", "xs").vars(false, false).len(), 2);
        // array of string: pointer-typed element -> pointer only
        assert_eq!(node("as", "xs").vars(false, false).len(), 1);
    }

    #[test]
    fn name_derivation_is_stable() {
        let n = node("ai", "foo");
        assert_eq!(n.iter_name(), "foo_iter");
        assert_eq!(n.len_name(), "foo_len");
        assert_eq!(n.loop_name(), "foo_p");
        assert_eq!(n.element_node().name, "foo_elem");

        let s = node("s", "foo");
        assert_eq!(s.value_name(), "foo_value");
    }

    #[test]
    fn array_of_array_of_scalar_rejected_at_construction() {
        let kind = TypeKind::parse("aai").unwrap();
        assert!(matches!(
            TypeNode::new(kind, "xs"),
            Err(CodegenError::MultiVariableElement { .. })
        ));
    }

    #[test]
    fn variant_struct_dict_rejected() {
        assert!(TypeKind::parse("v").is_err());
        assert!(TypeKind::parse("(i)").is_err());
        assert!(TypeKind::parse("a{si}").is_err());
    }

    #[test]
    fn error_tails_appear_verbatim() {
        let n = node("i", "a");
        let marshal = n.marshal("iter", "parent", "TYPE_ERR_TAIL", "MEM_ERR_TAIL", false, false);
        assert!(marshal.contains("TYPE_ERR_TAIL"));
        let dispatch = n.dispatch("iter", "MEM_ERR_TAIL", false, false);
        assert!(dispatch.contains("MEM_ERR_TAIL"));
    }

    #[test]
    fn array_of_string_has_no_terminator_length_var() {
        let n = node("as", "xs");
        assert_eq!(n.vars(false, false), vec![("char **".to_string(), "xs".to_string())]);
        let marshal = n.marshal("iter", "parent", "TERR", "MERR", false, false);
        assert!(marshal.contains("xs)[(xs_len)] = NULL"));
    }

    #[test]
    fn array_of_int_has_length_var_no_terminator() {
        let n = node("ai", "xs");
        assert_eq!(
            n.vars(false, false),
            vec![
                ("int32_t *".to_string(), "xs".to_string()),
                ("size_t".to_string(), "xs_len".to_string())
            ]
        );
        let marshal = n.marshal("iter", "parent", "TERR", "MERR", false, false);
        assert!(!marshal.contains(")] = NULL;\n"));
    }
}
