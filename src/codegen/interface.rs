//! Interface aggregator (§4.E): collects rendered members into the method
//! table, signal table, and interface descriptor the runtime registers the
//! object with (object mode), or just the per-member dispatch functions
//! (proxy mode).

use crate::config::{GeneratorConfig, Mode};
use crate::codegen::members::{MemberArtifacts, MethodCodegen, SignalCodegen};
use crate::error::Result;
use crate::model::Interface;

/// Everything rendered for one `<interface>`.
pub struct InterfaceCodegen<'a> {
    pub interface: &'a Interface,
    pub config: &'a GeneratorConfig,
}

/// Artifacts for a whole interface, already split into the pieces the
/// output assembler concatenates in fixed order.
pub struct InterfaceArtifacts {
    pub extern_prototypes: Vec<String>,
    pub static_prototypes: Vec<String>,
    pub globals: Vec<String>,
    pub functions: Vec<String>,
    /// `<iface>_methods`/`<iface>_signals`/`<iface>` table names (object
    /// mode only — `None` entries mean the table wasn't emitted).
    pub method_table: Option<String>,
    pub signal_table: Option<String>,
    pub descriptor: Option<String>,
}

fn iface_symbol(interface: &str) -> String {
    interface.replace('.', "_")
}

impl<'a> InterfaceCodegen<'a> {
    pub fn render(&self) -> Result<InterfaceArtifacts> {
        let iface_sym = iface_symbol(&self.interface.name);
        let mut extern_prototypes = Vec::new();
        let mut static_prototypes = Vec::new();
        let mut globals = Vec::new();
        let mut functions = Vec::new();
        let mut method_entries = Vec::new();
        let mut signal_entries = Vec::new();

        for method in self.interface.methods() {
            let artifacts = MethodCodegen {
                interface: &self.interface.name,
                method,
                config: self.config,
            }
            .render()?;
            self.absorb(&artifacts, &mut extern_prototypes, &mut static_prototypes, &mut globals, &mut functions);

            if self.config.mode == Mode::Object {
                let marshal = artifacts.marshal_symbol.expect("object mode methods always render a marshal fn");
                method_entries.push(format!(
                    "\t{{ \"{name}\", {args}, {marshal} }},",
                    name = method.name,
                    args = artifacts.args_symbol,
                ));
            }
        }

        for signal in self.interface.signals() {
            let rendered = SignalCodegen {
                interface: &self.interface.name,
                signal,
                config: self.config,
            }
            .render()?;
            if let Some(artifacts) = rendered {
                self.absorb(&artifacts, &mut extern_prototypes, &mut static_prototypes, &mut globals, &mut functions);
                if self.config.mode == Mode::Object {
                    signal_entries.push(format!(
                        "\t{{ \"{name}\", {args} }},",
                        name = signal.name,
                        args = artifacts.args_symbol,
                    ));
                }
            }
        }

        let (method_table, signal_table, descriptor) = if self.config.mode == Mode::Object {
            let methods_sym = format!("{iface_sym}_methods");
            let signals_sym = format!("{iface_sym}_signals");
            method_entries.push("\t{ NULL }".to_string());
            signal_entries.push("\t{ NULL }".to_string());
            globals.push(format!(
                "const NihDBusMethod {methods_sym}[] = {{\n{}\n}};\n",
                method_entries.join("\n")
            ));
            globals.push(format!(
                "const NihDBusSignal {signals_sym}[] = {{\n{}\n}};\n",
                signal_entries.join("\n")
            ));
            globals.push(format!(
                "const NihDBusInterface {iface_sym} = {{\n\t\"{name}\",\n\t{methods_sym},\n\t{signals_sym},\n\tNULL\n}};\n",
                name = self.interface.name,
            ));
            (Some(methods_sym), Some(signals_sym), Some(iface_sym))
        } else {
            (None, None, None)
        };

        Ok(InterfaceArtifacts {
            extern_prototypes,
            static_prototypes,
            globals,
            functions,
            method_table,
            signal_table,
            descriptor,
        })
    }

    fn absorb(
        &self,
        artifacts: &MemberArtifacts,
        extern_prototypes: &mut Vec<String>,
        static_prototypes: &mut Vec<String>,
        globals: &mut Vec<String>,
        functions: &mut Vec<String>,
    ) {
        if let Some(proto) = &artifacts.extern_prototype {
            extern_prototypes.push(proto.clone());
        }
        static_prototypes.push(artifacts.prototype.clone());
        globals.push(artifacts.args_array.clone());
        functions.extend(artifacts.functions.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, Mode};
    use crate::model::{Member, Method, Signal, Style};

    fn ping_interface() -> Interface {
        Interface {
            name: "com.example.Foo".into(),
            members: vec![Member::Method(Method {
                name: "Ping".into(),
                args: vec![],
                style: Style::Sync,
            })],
        }
    }

    #[test]
    fn s1_object_mode_emits_method_table_of_one() {
        let interface = ping_interface();
        let config = GeneratorConfig::new(Mode::Object, "dbus");
        let artifacts = InterfaceCodegen { interface: &interface, config: &config }.render().unwrap();

        assert_eq!(artifacts.method_table.as_deref(), Some("com_example_Foo_methods"));
        let table = artifacts
            .globals
            .iter()
            .find(|g| g.contains("com_example_Foo_methods[]"))
            .unwrap();
        assert_eq!(table.matches("com_example_Foo_Ping_marshal").count(), 1);
        assert!(artifacts.extern_prototypes[0].contains("dbus_ping"));
    }

    #[test]
    fn proxy_mode_emits_no_tables() {
        let interface = ping_interface();
        let config = GeneratorConfig::new(Mode::Proxy, "dbus");
        let artifacts = InterfaceCodegen { interface: &interface, config: &config }.render().unwrap();

        assert!(artifacts.method_table.is_none());
        assert!(artifacts.signal_table.is_none());
        assert!(artifacts.descriptor.is_none());
        assert!(artifacts.extern_prototypes.is_empty());
    }

    #[test]
    fn proxy_mode_signal_contributes_nothing() {
        let interface = Interface {
            name: "com.example.Foo".into(),
            members: vec![Member::Signal(Signal { name: "Changed".into(), args: vec![] })],
        };
        let config = GeneratorConfig::new(Mode::Proxy, "dbus");
        let artifacts = InterfaceCodegen { interface: &interface, config: &config }.render().unwrap();
        assert!(artifacts.functions.is_empty());
    }
}
