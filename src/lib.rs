//! Generates C marshalling/dispatch bindings from D-Bus introspection XML.
//!
//! The engine is a pure, synchronous transformation of a parsed interface
//! tree (see [`model`]) into generated C source text (see [`codegen`]); all
//! I/O lives in the ambient shell (`main.rs`).

pub mod codegen;
pub mod config;
pub mod error;
pub mod group;
pub mod model;
pub mod naming;
pub mod types;
pub mod xml;

pub use codegen::{assemble_header, assemble_source, InterfaceCodegen};
pub use config::{GeneratorConfig, Mode};
pub use error::{CodegenError, Result};
pub use model::Node;

/// Generate the source and header text for a parsed document under one
/// configuration. This is the engine's single public entry point; the CLI
/// shell is the only other caller of [`xml::parse_document`].
pub fn generate(node: &Node, base: &str, header_name: &str, config: &GeneratorConfig) -> Result<codegen::Assembled> {
    let mut artifacts = Vec::with_capacity(node.interfaces.len());
    for interface in &node.interfaces {
        artifacts.push(InterfaceCodegen { interface, config }.render()?);
    }

    Ok(codegen::Assembled {
        source: assemble_source(base, header_name, config.mode, &artifacts),
        header: assemble_header(base, config.mode, &artifacts),
    })
}
