//! Code synthesis: per-member strategies (§4.D), the interface aggregator
//! (§4.E), and the output assembler (§4.F).

pub mod assembler;
pub mod error_tails;
pub mod interface;
pub mod members;

pub use assembler::{assemble_header, assemble_source, Assembled};
pub use interface::InterfaceCodegen;
