/// Ramdisk command session
///
/// One session owns one open ramdisk. Commands arrive as text lines, either
/// typed at the `rdsh` prompt or replayed from a script; output goes to any
/// writer so sessions can be driven from tests.

use crate::error::{DemodiskError, Result};
use crate::format::FileKind;
use crate::io::{read_file, read_ramdisk, write_atomic, write_ramdisk};
use crate::map::{render_map, Segment};
use crate::ramdisk::{Attributes, Ramdisk};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command names offered for completion
pub const COMMAND_NAMES: &[&str] = &[
    "add", "commit", "delete", "dir", "dump", "exit", "extract", "flags", "help", "info", "inject",
    "list", "ls", "map", "mv", "quit", "rename", "rm", "save", "showfat", "stat",
];

/// Width of the map bar
const MAP_WIDTH: usize = 64;

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List entries
    List,
    /// Write an entry's contents to a host file
    Extract {
        /// Entry name
        name: String,
        /// Host path, defaults to the entry name
        path: Option<String>,
    },
    /// Add a host file as a new entry
    Inject {
        /// Host path to read
        path: String,
        /// Entry name, defaults to the host file name
        name: Option<String>,
    },
    /// Remove an entry
    Delete(String),
    /// Rename an entry
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },
    /// Show or set an entry's attribute word
    Flags {
        /// Entry name
        name: String,
        /// New value, or `None` to show the current one
        value: Option<String>,
    },
    /// Show ramdisk size summary
    Info,
    /// Dump an entry's directory record
    Stat(String),
    /// Draw the entry layout
    Map,
    /// Write the ramdisk out
    Save(Option<String>),
    /// Show command help
    Help,
    /// End the session
    Quit,
}

impl Command {
    /// Parse one input line; blank lines and `#` comments give `None`
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts = parse_command_line(line);
        let Some(first) = parts.first() else {
            return Ok(None);
        };
        let arg = |i: usize| parts.get(i).cloned();
        let need = |i: usize, usage: &str| {
            parts
                .get(i)
                .cloned()
                .ok_or_else(|| DemodiskError::config(format!("Usage: {}", usage)))
        };

        let command = match first.to_lowercase().as_str() {
            "ls" | "list" | "dir" => Command::List,
            "extract" | "dump" => Command::Extract {
                name: need(1, "extract <name> [host_path]")?,
                path: arg(2),
            },
            "inject" | "add" => Command::Inject {
                path: need(1, "inject <host_path> [name]")?,
                name: arg(2),
            },
            "delete" | "rm" => Command::Delete(need(1, "rm <name>")?),
            "rename" | "mv" => Command::Rename {
                old: need(1, "rename <old> <new>")?,
                new: need(2, "rename <old> <new>")?,
            },
            "flags" => Command::Flags {
                name: need(1, "flags <name> [0x81fd|0x81a4|0x81b4|0x41fd]")?,
                value: arg(2),
            },
            "info" => Command::Info,
            "stat" | "showfat" => Command::Stat(need(1, "stat <name>")?),
            "map" => Command::Map,
            "save" | "commit" => Command::Save(arg(1)),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(DemodiskError::config(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

/// What the caller should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command
    Continue,
    /// Stop the session
    Quit,
}

/// A ramdisk bound to its file and an output stream
pub struct Session<W: Write> {
    ramdisk: Ramdisk,
    path: PathBuf,
    kind: FileKind,
    base_dir: PathBuf,
    out: W,
}

impl<W: Write> Session<W> {
    /// Open the ramdisk file at `path`
    pub fn open<P: AsRef<Path>>(path: P, out: W) -> Result<Self> {
        let (ramdisk, kind) = read_ramdisk(&path)?;
        Ok(Self::new(ramdisk, path.as_ref().to_path_buf(), kind, out))
    }

    /// Bind an in-memory ramdisk to the file it is saved to
    pub fn new(ramdisk: Ramdisk, path: PathBuf, kind: FileKind, out: W) -> Self {
        Self {
            ramdisk,
            path,
            kind,
            base_dir: PathBuf::from("."),
            out,
        }
    }

    /// Resolve relative host paths against `dir` instead of the current directory
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Get the ramdisk
    pub fn ramdisk(&self) -> &Ramdisk {
        &self.ramdisk
    }

    /// File the ramdisk saves to by default
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the session, returning the output stream
    pub fn into_output(self) -> W {
        self.out
    }

    fn host_path(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Parse and run one line
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        match Command::parse(line)? {
            Some(command) => self.run(command),
            None => Ok(Flow::Continue),
        }
    }

    /// Replay a script, stopping at the first failing line
    pub fn run_script(&mut self, script: &str) -> Result<Flow> {
        for (index, line) in script.lines().enumerate() {
            let flow = self.execute(line).map_err(|e| DemodiskError::Script {
                line: index + 1,
                message: e.to_string(),
            })?;
            if flow == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Run a parsed command
    pub fn run(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::List => self.list()?,
            Command::Extract { name, path } => {
                let target = self.host_path(path.as_deref().unwrap_or(&name));
                let data = self.ramdisk.read_entry(&name)?;
                write_atomic(&target, data)?;
                writeln!(self.out, "Extracted '{}' ({} bytes) to {}", name, data.len(), target.display())?;
            }
            Command::Inject { path, name } => {
                let source = self.host_path(&path);
                let name = match name {
                    Some(name) => name,
                    None => source
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                        .ok_or_else(|| DemodiskError::config(format!("'{}' has no file name", path)))?,
                };
                let data = read_file(&source)?;
                let size = data.len();
                self.ramdisk.add_entry(&name, data, Attributes::default())?;
                writeln!(self.out, "Injected '{}' ({} bytes)", name, size)?;
            }
            Command::Delete(name) => {
                self.ramdisk.remove_entry(&name)?;
                writeln!(self.out, "Removed '{}'", name)?;
            }
            Command::Rename { old, new } => {
                self.ramdisk.rename_entry(&old, &new)?;
                writeln!(self.out, "Renamed '{}' to '{}'", old, new)?;
            }
            Command::Flags { name, value } => {
                if let Some(value) = value {
                    self.ramdisk.set_attributes(&name, Attributes::parse_known(&value)?)?;
                }
                let attributes = self
                    .ramdisk
                    .entry(&name)
                    .map(|e| e.attributes())
                    .ok_or_else(|| DemodiskError::not_found(name.as_str()))?;
                writeln!(self.out, "{}: {}", name, attributes)?;
            }
            Command::Info => self.info()?,
            Command::Stat(name) => {
                let record = self.ramdisk.directory_record(&name)?;
                writeln!(self.out, "'{}':", name)?;
                write_hex_dump(&mut self.out, &record, record.len())?;
            }
            Command::Map => {
                let segments: Vec<Segment> = self
                    .ramdisk
                    .entry_infos()
                    .into_iter()
                    .map(|e| Segment::new(e.name, e.offset, e.size))
                    .collect();
                let info = self.ramdisk.info();
                let map = render_map("Ramdisk Map", &segments, info.total_size, MAP_WIDTH);
                write!(self.out, "{}", map)?;
            }
            Command::Save(path) => self.save(path)?,
            Command::Help => print_help(&mut self.out)?,
            Command::Quit => {
                if self.ramdisk.is_changed() {
                    writeln!(self.out, "Discarding unsaved changes.")?;
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn list(&mut self) -> Result<()> {
        let infos = self.ramdisk.entry_infos();
        if infos.is_empty() {
            writeln!(self.out, "No entries.")?;
            return Ok(());
        }
        for info in &infos {
            writeln!(
                self.out,
                "{} {:>9} {:#08x} {}",
                info.attributes.mode_string(),
                info.size,
                info.offset,
                info.name
            )?;
        }
        writeln!(self.out, "{} entries", infos.len())?;
        Ok(())
    }

    fn info(&mut self) -> Result<()> {
        let info = self.ramdisk.info();
        writeln!(self.out, "File: {} ({})", self.path.display(), self.kind)?;
        writeln!(self.out, "Entries: {}", info.entry_count)?;
        writeln!(self.out, "Directory: {} bytes", info.directory_size)?;
        writeln!(self.out, "Data: {} bytes", info.data_size)?;
        writeln!(self.out, "Total: {} bytes", info.total_size)?;
        writeln!(self.out, "Changed: {}", if self.ramdisk.is_changed() { "Yes" } else { "No" })?;
        Ok(())
    }

    fn save(&mut self, path: Option<String>) -> Result<()> {
        let (target, kind) = match path {
            Some(path) => {
                let target = self.host_path(&path);
                let kind = FileKind::from_path(&target).unwrap_or(self.kind);
                (target, kind)
            }
            None => (self.path.clone(), self.kind),
        };
        let written = write_ramdisk(&target, &mut self.ramdisk, kind)?;
        writeln!(self.out, "Saved {} ({}, {} bytes)", target.display(), kind, written)?;
        Ok(())
    }
}

/// Split a line into words, keeping quoted strings together
pub fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Write the command table
pub fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  ls, list, dir                 - List entries (mode, size, offset, name)")?;
    writeln!(out, "  extract <name> [host_path]    - Write an entry to a host file (dump)")?;
    writeln!(out, "  inject <host_path> [name]     - Add a host file as a new entry (add)")?;
    writeln!(out, "  rm <name>                     - Remove an entry (delete)")?;
    writeln!(out, "  rename <old> <new>            - Rename an entry (mv)")?;
    writeln!(out, "  flags <name> [value]          - Show or set attributes (0x81fd, 0x81a4, 0x81b4, 0x41fd)")?;
    writeln!(out, "  info                          - Show ramdisk size summary")?;
    writeln!(out, "  stat <name>                   - Dump an entry's directory record (showfat)")?;
    writeln!(out, "  map                           - Visual entry layout")?;
    writeln!(out, "  save [path]                   - Write the ramdisk (commit); kind follows the extension")?;
    writeln!(out, "  help                          - Show this help")?;
    writeln!(out, "  quit, exit                    - Exit")?;
    Ok(())
}

/// Write a classic 16 bytes per row hex dump
pub fn write_hex_dump<W: Write>(out: &mut W, data: &[u8], max_bytes: usize) -> std::io::Result<()> {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        write!(out, "{:04X}: ", i * 16)?;
        for (j, byte) in chunk.iter().enumerate() {
            write!(out, "{:02X} ", byte)?;
            if j == 7 {
                write!(out, " ")?;
            }
        }
        for j in chunk.len()..16 {
            write!(out, "   ")?;
            if j == 7 {
                write!(out, " ")?;
            }
        }

        let ascii: String = chunk
            .iter()
            .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
            .collect();
        writeln!(out, " |{}|", ascii)?;
    }

    if data.len() > max_bytes {
        writeln!(out, "... ({} more bytes)", data.len() - max_bytes)?;
    }
    Ok(())
}
