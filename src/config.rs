//! Generator configuration.
//!
//! The original tool reads two process-wide module globals (`mode`,
//! `extern_prefix`) while walking the interface tree. This re-implementation
//! threads an explicit [`GeneratorConfig`] through every call instead, per
//! the Design Notes' "explicit context, no globals" guidance.

use clap::ValueEnum;

/// Which side of the interface to generate bindings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Server side: marshal incoming calls into handler invocations and
    /// dispatch replies.
    Object,
    /// Client side: dispatch call arguments into messages and marshal
    /// replies back into typed locals.
    Proxy,
}

/// Immutable, process-wide-free configuration for a single generation pass.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub mode: Mode,
    /// Leading token of emitted external handler function names
    /// (e.g. `dbus` in `dbus_test_int32`).
    pub extern_prefix: String,
}

impl GeneratorConfig {
    pub fn new(mode: Mode, extern_prefix: impl Into<String>) -> Self {
        Self {
            mode,
            extern_prefix: extern_prefix.into(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(Mode::Object, "dbus")
    }
}
