//! TypeGroup: an ordered sequence of type nodes sharing one `(pointer,
//! const)` modifier pair (§4.C).

use crate::types::TypeNode;

/// A sequence of type nodes generated and checked together — the in-args or
/// out-args of one member, always sharing a single modifier pair.
pub struct TypeGroup<'a> {
    nodes: &'a [TypeNode],
    pointer: bool,
    const_: bool,
}

impl<'a> TypeGroup<'a> {
    pub fn new(nodes: &'a [TypeNode], pointer: bool, const_: bool) -> Self {
        TypeGroup { nodes, pointer, const_ }
    }

    /// Concatenated wire signature of every node in order.
    pub fn signature(&self) -> String {
        self.nodes.iter().map(|n| n.signature()).collect()
    }

    /// Concatenated `vars()` of every node in order.
    pub fn vars(&self) -> Vec<(String, String)> {
        self.nodes.iter().flat_map(|n| n.vars(self.pointer, self.const_)).collect()
    }

    /// Concatenated `locals()` of every node in order.
    pub fn locals(&self) -> Vec<(String, String)> {
        self.nodes.iter().flat_map(|n| n.locals(self.const_)).collect()
    }

    /// Concatenated marshal blocks, followed by an end-of-iterator check
    /// that branches to `type_error` if the message carries extra
    /// arguments.
    pub fn marshal(&self, iter_name: &str, parent: &str, type_error: &str, mem_error: &str) -> String {
        let mut code = String::new();
        for node in self.nodes {
            code.push_str(&node.marshal(iter_name, parent, type_error, mem_error, self.pointer, self.const_));
            code.push('\n');
        }
        code.push_str(&format!(
            "if (dbus_message_iter_get_arg_type (&{iter}) != DBUS_TYPE_INVALID) {{\n{terr}\n}}\n",
            iter = iter_name,
            terr = type_error,
        ));
        code
    }

    /// Concatenated dispatch blocks, in order.
    pub fn dispatch(&self, iter_name: &str, mem_error: &str) -> String {
        self.nodes
            .iter()
            .map(|n| n.dispatch(iter_name, mem_error, self.pointer, self.const_))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, TypeNode};

    fn node(sig: &str, name: &str) -> TypeNode {
        TypeNode::from_arg(name, sig, Direction::In).unwrap()
    }

    #[test]
    fn empty_group_signature_is_empty() {
        let nodes: Vec<TypeNode> = vec![];
        let group = TypeGroup::new(&nodes, false, false);
        assert_eq!(group.signature(), "");
        assert!(group.vars().is_empty());
    }

    #[test]
    fn signature_concatenates_in_order() {
        let nodes = vec![node("i", "a"), node("s", "b")];
        let group = TypeGroup::new(&nodes, false, false);
        assert_eq!(group.signature(), "is");
    }

    #[test]
    fn marshal_ends_with_invalid_arg_check() {
        let nodes = vec![node("i", "a")];
        let group = TypeGroup::new(&nodes, false, false);
        let out = group.marshal("iter", "message", "TERR", "MERR");
        assert!(out.trim_end().ends_with("}"));
        assert!(out.contains("DBUS_TYPE_INVALID"));
        assert!(out.contains("TERR"));
    }

    #[test]
    fn vars_use_shared_modifiers() {
        let nodes = vec![node("i", "a")];
        let group = TypeGroup::new(&nodes, true, true);
        assert_eq!(group.vars(), vec![("const int32_t *".to_string(), "a".to_string())]);
    }
}
