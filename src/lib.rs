//! Translator from stack VM code to Hack assembly.
//!
//! A program is one or more translation units (usually one `.vm` file per
//! class). All units are written to a single assembly stream, preceded by
//! the bootstrap.

pub mod ast;
pub mod config;
pub mod emitter;
pub mod error;
pub mod labels;
pub mod parser;
pub mod segment;
pub mod translator;

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

pub use ast::Command;
pub use config::TranslatorConfig;
pub use emitter::{Emitter, Instruction};
pub use error::{Result, TranslateError};
pub use translator::Translator;

/// One parsed source unit.
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub commands: Vec<Command>,
}

pub fn parse_unit(name: &str, source: &str) -> Result<Unit> {
    Ok(Unit {
        name: name.to_string(),
        commands: parser::parse(name, source)?,
    })
}

/// Translates every unit, in order, into `out`.
pub fn translate_program<'a, W: Write>(
    units: impl IntoIterator<Item = &'a Unit>,
    out: W,
    config: &TranslatorConfig,
) -> Result<W> {
    let mut emitter = Emitter::new(out, config.comments);
    let mut translator = Translator::new(&config.entry_point);

    if config.bootstrap {
        info!(entry = %config.entry_point, "writing bootstrap");
        emitter.emit_all(&translator.bootstrap()?)?;
    }

    for unit in units {
        info!(unit = %unit.name, commands = unit.commands.len(), "translating unit");
        translator.begin_unit(&unit.name);
        for command in &unit.commands {
            let code = translator.translate_command(command)?;
            emitter
                .emit_all(&code)
                .map_err(|e| e.in_command(command))?;
        }
    }

    info!(words = emitter.written(), "translation finished");
    emitter.finish()
}

pub fn translate_to_string(units: &[Unit], config: &TranslatorConfig) -> Result<String> {
    let out = translate_program(units, Vec::new(), config)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Reads a `.vm` file, or every `.vm` file of a directory in name order.
pub fn load_units(input: &Path) -> Result<Vec<Unit>> {
    let mut paths: Vec<PathBuf> = if input.is_dir() {
        fs::read_dir(input)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .filter(|p| p.is_file() && p.extension() == Some(OsStr::new("vm")))
            .collect()
    } else {
        vec![input.to_path_buf()]
    };
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let name = path.file_stem().and_then(OsStr::to_str).unwrap_or_default();
            parse_unit(name, &fs::read_to_string(path)?)
        })
        .collect()
}

/// `Foo.vm` -> `Foo.asm`; `dir/` -> `dir/dir.asm`.
pub fn default_output(input: &Path) -> PathBuf {
    if input.is_dir() {
        let mut name = input
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(OsStr::to_os_string))
            .unwrap_or_else(|| "out".into());
        name.push(".asm");
        input.join(name)
    } else {
        input.with_extension("asm")
    }
}
