//! The parsed interface tree: what the XML loader produces and everything
//! downstream (type engine, member strategies, interface aggregator) reads.

use crate::types::{Direction, TypeNode};

/// A single `<arg>` element: a name, wire signature, and which way it
/// crosses the wire, already resolved into a [`TypeNode`].
#[derive(Debug, Clone)]
pub struct Arg {
    pub node: TypeNode,
}

impl Arg {
    pub fn direction(&self) -> Direction {
        self.node.direction.expect("Arg nodes always carry a direction")
    }
}

/// Reply strategy for a method, read from the mode-scoped
/// `{XMLNS}object`/`{XMLNS}proxy` attribute. Default is `Sync`; only
/// methods admit `Async`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Sync,
    Async,
}

/// A `<method>` element: ordered `in`/`out` args.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub args: Vec<Arg>,
    pub style: Style,
}

impl Method {
    pub fn in_args(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter().filter(|a| a.direction() == Direction::In)
    }

    pub fn out_args(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter().filter(|a| a.direction() == Direction::Out)
    }
}

/// A `<signal>` element: args are implicitly `out` (emitted by the object,
/// received by the proxy) even when the XML omits `direction`.
#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub args: Vec<Arg>,
}

/// A member of an interface: a method or a signal.
#[derive(Debug, Clone)]
pub enum Member {
    Method(Method),
    Signal(Signal),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Method(m) => &m.name,
            Member::Signal(s) => &s.name,
        }
    }
}

/// A `<interface>` element: a name and its ordered members.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub members: Vec<Member>,
}

impl Interface {
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            Member::Signal(_) => None,
        })
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.members.iter().filter_map(|m| match m {
            Member::Signal(signal) => Some(signal),
            Member::Method(_) => None,
        })
    }
}

/// The root `<node>` element: every interface declared for one object.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub interfaces: Vec<Interface>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    fn arg(name: &str, sig: &str, dir: Direction) -> Arg {
        Arg {
            node: TypeNode::from_arg(name, sig, dir).unwrap(),
        }
    }

    #[test]
    fn method_splits_args_by_direction() {
        let method = Method {
            name: "Ping".into(),
            args: vec![
                arg("value", "i", Direction::In),
                arg("result", "s", Direction::Out),
            ],
            style: Style::Sync,
        };
        assert_eq!(method.in_args().count(), 1);
        assert_eq!(method.out_args().count(), 1);
        assert_eq!(method.in_args().next().unwrap().node.name, "value");
    }

    #[test]
    fn interface_partitions_methods_and_signals() {
        let iface = Interface {
            name: "com.example.Test".into(),
            members: vec![
                Member::Method(Method { name: "Ping".into(), args: vec![], style: Style::Sync }),
                Member::Signal(Signal { name: "Changed".into(), args: vec![] }),
            ],
        };
        assert_eq!(iface.methods().count(), 1);
        assert_eq!(iface.signals().count(), 1);
        assert_eq!(TypeKind::Byte.native_type(), "uint8_t");
    }
}
