//! Output assembler (§4.F): concatenates every interface's artifacts into
//! one source unit and one header unit, in a fixed order.

use crate::codegen::interface::InterfaceArtifacts;
use crate::config::Mode;
use crate::naming::camel_to_snake;

/// The two files one generation pass produces.
pub struct Assembled {
    pub source: String,
    pub header: String,
}

fn base_upper(base: &str) -> String {
    camel_to_snake(base).to_uppercase()
}

/// Renders `<base>.c`: license preamble, includes, (object mode) extern
/// handler prototypes, (object mode) static marshal prototypes, global
/// variables, then every function body — in that fixed order.
pub fn assemble_source(base: &str, header_name: &str, mode: Mode, interfaces: &[InterfaceArtifacts]) -> String {
    let mut out = String::new();
    out.push_str(LICENSE_PREAMBLE);
    out.push('\n');
    out.push_str(&format!(
        "#include <dbus/dbus.h>\n\n#include <nih/macros.h>\n#include <nih/alloc.h>\n#include <nih/string.h>\n#include <nih/errno.h>\n\n#include <nih-dbus/dbus_object.h>\n#include <nih-dbus/dbus_proxy.h>\n#include <nih-dbus/dbus_message.h>\n\n#include \"{header_name}\"\n\n",
    ));

    if mode == Mode::Object {
        let externs: Vec<&str> = interfaces.iter().flat_map(|i| i.extern_prototypes.iter().map(String::as_str)).collect();
        if !externs.is_empty() {
            out.push_str(&externs.join("\n"));
            out.push_str("\n\n");
        }

        let statics: Vec<&str> = interfaces.iter().flat_map(|i| i.static_prototypes.iter().map(String::as_str)).collect();
        if !statics.is_empty() {
            out.push_str(&statics.join("\n"));
            out.push_str("\n\n");
        }
    }

    for iface in interfaces {
        for global in &iface.globals {
            out.push_str(global);
            out.push('\n');
        }
    }

    for iface in interfaces {
        for function in &iface.functions {
            out.push_str(function);
            out.push('\n');
        }
    }

    out
}

/// Renders `<base>.h`: sentinel guard, runtime includes, then an
/// extern-C-guarded block of variable externs followed by function
/// prototypes.
pub fn assemble_header(base: &str, mode: Mode, interfaces: &[InterfaceArtifacts]) -> String {
    let sentinel = format!("DBUS__{}_H", base_upper(base));
    let mut out = String::new();
    out.push_str(LICENSE_PREAMBLE);
    out.push('\n');
    out.push_str(&format!("#ifndef {sentinel}\n#define {sentinel}\n\n"));
    out.push_str("#include <dbus/dbus.h>\n\n#include <nih-dbus/dbus_object.h>\n#include <nih-dbus/dbus_proxy.h>\n\n");
    out.push_str("NIH_BEGIN_EXTERN\n\n");

    if mode == Mode::Object {
        for iface in interfaces {
            if let Some(table) = &iface.method_table {
                out.push_str(&format!("extern const NihDBusMethod {table}[];\n"));
            }
            if let Some(table) = &iface.signal_table {
                out.push_str(&format!("extern const NihDBusSignal {table}[];\n"));
            }
            if let Some(descriptor) = &iface.descriptor {
                out.push_str(&format!("extern const NihDBusInterface {descriptor};\n"));
            }
        }
        out.push('\n');
    }

    for iface in interfaces {
        for proto in &iface.static_prototypes {
            if let Some(public) = proto.strip_prefix("static ") {
                out.push_str(public);
            } else {
                out.push_str(proto);
            }
            out.push('\n');
        }
    }

    out.push_str("\nNIH_END_EXTERN\n\n");
    out.push_str(&format!("#endif /* {sentinel} */\n"));
    out
}

const LICENSE_PREAMBLE: &str = "/* Generated code. Do not edit. */\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::interface::InterfaceCodegen;
    use crate::config::GeneratorConfig;
    use crate::model::{Interface, Member, Method, Style};

    fn ping_interface() -> Interface {
        Interface {
            name: "com.example.Foo".into(),
            members: vec![Member::Method(Method { name: "Ping".into(), args: vec![], style: Style::Sync })],
        }
    }

    #[test]
    fn s1_object_mode_source_contains_marshal_and_prototype() {
        let iface = ping_interface();
        let config = GeneratorConfig::new(Mode::Object, "dbus");
        let artifacts = InterfaceCodegen { interface: &iface, config: &config }.render().unwrap();
        let source = assemble_source("foo", "foo.h", Mode::Object, &[artifacts]);

        assert!(source.contains("com_example_Foo_Ping_marshal"));
        assert!(source.contains("extern int dbus_ping"));
        assert!(source.contains("#include \"foo.h\""));
    }

    #[test]
    fn header_sentinel_derives_from_base() {
        let iface = ping_interface();
        let config = GeneratorConfig::new(Mode::Object, "dbus");
        let artifacts = InterfaceCodegen { interface: &iface, config: &config }.render().unwrap();
        let header = assemble_header("test_object", Mode::Object, &[artifacts]);

        assert!(header.contains("#ifndef DBUS__TEST_OBJECT_H"));
        assert!(header.contains("#define DBUS__TEST_OBJECT_H"));
        assert!(header.contains("NIH_BEGIN_EXTERN"));
        assert!(header.contains("NIH_END_EXTERN"));
        assert!(header.contains("extern const NihDBusInterface com_example_Foo;"));
    }

    #[test]
    fn proxy_mode_header_has_no_tables() {
        let iface = ping_interface();
        let config = GeneratorConfig::new(Mode::Proxy, "dbus");
        let artifacts = InterfaceCodegen { interface: &iface, config: &config }.render().unwrap();
        let header = assemble_header("foo", Mode::Proxy, &[artifacts]);
        assert!(!header.contains("NihDBusInterface"));
    }
}
