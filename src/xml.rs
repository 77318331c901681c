//! Loads D-Bus introspection XML into the [`crate::model`] tree.
//!
//! The sole caller of [`TypeNode::from_arg`] / `TypeKind::parse`; every
//! signature or attribute error raised while walking the document surfaces
//! as a [`CodegenError`] naming the offending element.

use roxmltree::{Document, Node as XmlNode};

use crate::config::Mode;
use crate::error::{CodegenError, Result};
use crate::model::{Arg, Interface, Member, Method, Node, Signal, Style};
use crate::types::Direction;

const XMLNS: &str = "http://www.netsplit.com/nih/dbus";

/// Parse a complete introspection document, rooted at either `<node>` or a
/// bare `<interface>`. `mode` is the generator mode already active for this
/// run — it picks which of the mode-scoped `{XMLNS}object`/`{XMLNS}proxy`
/// style attributes `member_style` consults.
pub fn parse_document(xml: &str, mode: Mode) -> Result<Node> {
    let doc = Document::parse(xml).map_err(|e| CodegenError::UnknownSignature(format!("XML parse error: {e}")))?;
    let root = doc.root_element();

    let mut node = Node::default();
    if root.has_tag_name("interface") {
        node.interfaces.push(parse_interface(root, mode)?);
    } else {
        for child in root.children().filter(|c| c.has_tag_name("interface")) {
            node.interfaces.push(parse_interface(child, mode)?);
        }
    }
    Ok(node)
}

fn required_attr<'a>(node: &'a XmlNode, element: &str, attribute: &str) -> Result<&'a str> {
    node.attribute(attribute).ok_or_else(|| CodegenError::MissingAttribute {
        element: element.to_string(),
        attribute: attribute.to_string(),
    })
}

fn parse_interface(node: XmlNode, mode: Mode) -> Result<Interface> {
    let name = required_attr(&node, "interface", "name")?.to_string();
    let mut members = Vec::new();
    for child in node.children() {
        if child.has_tag_name("method") {
            members.push(Member::Method(parse_method(child, &name, mode)?));
        } else if child.has_tag_name("signal") {
            members.push(Member::Signal(parse_signal(child, &name)?));
        }
    }
    Ok(Interface { name, members })
}

/// Reads the style attribute scoped to the currently active `mode` —
/// `{XMLNS}object` when generating object-mode code, `{XMLNS}proxy` when
/// generating proxy-mode code — mirroring `elem.get(QName(XMLNS, mode),
/// default)` in the original tool. The other mode's attribute, if present,
/// is not consulted. Absent attribute defaults to `Sync`.
pub fn member_style(node: &XmlNode, mode: Mode) -> Result<Style> {
    let attr_name = match mode {
        Mode::Object => "object",
        Mode::Proxy => "proxy",
    };
    match node.attribute((XMLNS, attr_name)) {
        Some("sync") => Ok(Style::Sync),
        Some("async") => Ok(Style::Async),
        Some(other) => Err(CodegenError::InvalidDirection {
            member: node.attribute("name").unwrap_or("<unnamed>").to_string(),
            value: other.to_string(),
        }),
        None => Ok(Style::Sync),
    }
}

fn parse_method(node: XmlNode, interface: &str, mode: Mode) -> Result<Method> {
    let name = required_attr(&node, &format!("{interface}: method"), "name")?.to_string();
    let args = parse_args(&node, &format!("{interface}.{name}"), true)?;
    let style = member_style(&node, mode)?;
    Ok(Method { name, args, style })
}

fn parse_signal(node: XmlNode, interface: &str) -> Result<Signal> {
    let name = required_attr(&node, &format!("{interface}: signal"), "name")?.to_string();
    let args = parse_args(&node, &format!("{interface}.{name}"), false)?;
    Ok(Signal { name, args })
}

fn parse_args(node: &XmlNode, member_path: &str, directional: bool) -> Result<Vec<Arg>> {
    let mut args = Vec::new();
    for child in node.children().filter(|c| c.has_tag_name("arg")) {
        let arg_name = required_attr(&child, &format!("{member_path}: arg"), "name")?;
        let sig = required_attr(&child, &format!("{member_path}: arg {arg_name}"), "type")?;
        let direction = if directional {
            match child.attribute("direction") {
                None | Some("in") => Direction::In,
                Some("out") => Direction::Out,
                Some(other) => {
                    return Err(CodegenError::InvalidDirection {
                        member: format!("{member_path}.{arg_name}"),
                        value: other.to_string(),
                    });
                }
            }
        } else {
            Direction::Out
        };
        let node = crate::types::TypeNode::from_arg(arg_name, sig, direction)?;
        args.push(Arg { node });
    }
    Ok(args)
}
