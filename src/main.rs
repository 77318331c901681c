//! CLI entry point: reads introspection XML, generates C bindings, and
//! writes `<base>.c` / `<base>.h` atomically.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use dbus_codegen_tool::{generate, GeneratorConfig, Mode};

#[derive(Parser, Debug)]
#[command(name = "dbus-codegen-tool", about = "Generate C marshalling/dispatch bindings from D-Bus introspection XML")]
struct Args {
    /// Path to the introspection XML document.
    xml_path: PathBuf,

    /// Which side of the interface to generate.
    #[arg(long, value_enum, default_value = "object")]
    mode: Mode,

    /// Output basename (defaults to the XML file's basename).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leading token of emitted external handler function names.
    #[arg(long, default_value = "dbus")]
    prefix: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("dbus-codegen-tool: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> dbus_codegen_tool::Result<()> {
    let config = GeneratorConfig::new(args.mode, args.prefix.clone());

    let xml = fs::read_to_string(&args.xml_path)?;
    let node = dbus_codegen_tool::xml::parse_document(&xml, config.mode)?;

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(args.xml_path.file_stem().unwrap_or_default()));
    let base_name = base.file_name().and_then(|s| s.to_str()).unwrap_or("output").to_string();

    let source_path = base.with_extension("c");
    let header_path = base.with_extension("h");
    let header_name = header_path.file_name().and_then(|s| s.to_str()).unwrap_or("output.h").to_string();

    let assembled = generate(&node, &base_name, &header_name, &config)?;

    write_outputs(&source_path, &header_path, &assembled.source, &assembled.header)
}

/// Writes both output files to `.{base}.{c,h}.tmp` and renames them into
/// place. On any failure both temporaries are unlinked and no partial
/// output is left behind.
fn write_outputs(source_path: &Path, header_path: &Path, source_text: &str, header_text: &str) -> dbus_codegen_tool::Result<()> {
    let source_tmp = sibling_tmp(source_path);
    let header_tmp = sibling_tmp(header_path);

    let result = (|| -> dbus_codegen_tool::Result<()> {
        write_file(&source_tmp, source_text)?;
        write_file(&header_tmp, header_text)?;
        fs::rename(&source_tmp, source_path)?;
        fs::rename(&header_tmp, header_path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&source_tmp);
        let _ = fs::remove_file(&header_tmp);
    }
    result
}

fn sibling_tmp(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("output");
    path.with_file_name(format!(".{file_name}.tmp"))
}

fn write_file(path: &Path, text: &str) -> dbus_codegen_tool::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_tmp_names_are_hidden_and_unique_per_extension() {
        let c = sibling_tmp(Path::new("/tmp/out/foo.c"));
        let h = sibling_tmp(Path::new("/tmp/out/foo.h"));
        assert_eq!(c, Path::new("/tmp/out/.foo.c.tmp"));
        assert_eq!(h, Path::new("/tmp/out/.foo.h.tmp"));
    }

    #[test]
    fn write_outputs_renames_both_files_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("foo.c");
        let header_path = dir.path().join("foo.h");

        write_outputs(&source_path, &header_path, "/* c */", "/* h */").unwrap();

        assert_eq!(fs::read_to_string(&source_path).unwrap(), "/* c */");
        assert_eq!(fs::read_to_string(&header_path).unwrap(), "/* h */");
        assert!(!sibling_tmp(&source_path).exists());
        assert!(!sibling_tmp(&header_path).exists());
    }

    #[test]
    fn write_outputs_leaves_no_partial_files_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("foo.c");
        // A header path under a directory that doesn't exist forces the
        // second rename to fail after the first temp file was written.
        let header_path = dir.path().join("missing").join("foo.h");

        assert!(write_outputs(&source_path, &header_path, "/* c */", "/* h */").is_err());
        assert!(!source_path.exists());
        assert!(!sibling_tmp(&source_path).exists());
    }
}
