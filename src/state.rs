//! The `.draw` format: one vertex per line, as the raw bit patterns of its
//! coordinates followed by its color packed as `0xRRGGBBAA`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use egui::{Color32, Pos2};
use thiserror::Error;

use crate::colors;
use crate::store::{SEGMENT_VERTICES, Vertex};

pub const DRAWING_EXTENSION: &str = "draw";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: expected three integers, found {content:?}")]
    Malformed { line: usize, content: String },
    #[error("nothing to export")]
    Empty,
}

impl PersistError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Record {
    x: u32,
    y: u32,
    color: u32,
}

impl From<&Vertex> for Record {
    fn from(vertex: &Vertex) -> Self {
        Self {
            x: vertex.position.x.to_bits(),
            y: vertex.position.y.to_bits(),
            color: pack_color(vertex.color),
        }
    }
}

impl From<Record> for Vertex {
    fn from(record: Record) -> Self {
        Vertex::new(
            Pos2::new(f32::from_bits(record.x), f32::from_bits(record.y)),
            colors::from_channels(record.color.to_be_bytes()),
        )
    }
}

impl Record {
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace().map(parse_word);
        let record = Self {
            x: fields.next()??,
            y: fields.next()??,
            color: fields.next()??,
        };
        fields.next().is_none().then_some(record)
    }
}

/// Accepts unsigned words as well as negative ones written by older
/// signed formatting, which share the same bit pattern.
fn parse_word(word: &str) -> Option<u32> {
    word.parse::<u32>()
        .ok()
        .or_else(|| word.parse::<i32>().ok().map(|signed| signed as u32))
}

pub fn write_vertices<W: Write>(mut out: W, vertices: &[Vertex]) -> io::Result<()> {
    for vertex in vertices {
        let Record { x, y, color } = Record::from(vertex);
        writeln!(out, "{x} {y} {color}")?;
    }
    out.flush()
}

pub fn read_vertices<R: BufRead>(input: R) -> Result<Vec<Vertex>, PersistError> {
    let mut vertices = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(PersistError::io(Path::new("<input>")))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = Record::parse(&line).ok_or_else(|| PersistError::Malformed {
            line: index + 1,
            content: line.clone(),
        })?;
        vertices.push(record.into());
    }
    if vertices.len() % SEGMENT_VERTICES != 0 {
        log::warn!("drawing ends with an unpaired vertex, dropping it");
        vertices.pop();
    }
    Ok(vertices)
}

pub fn load(path: &Path) -> Result<Vec<Vertex>, PersistError> {
    let file = File::open(path).map_err(PersistError::io(path))?;
    read_vertices(BufReader::new(file)).map_err(|err| match err {
        PersistError::Io { source, .. } => PersistError::io(path)(source),
        other => other,
    })
}

pub fn save_to(path: &Path, vertices: &[Vertex]) -> Result<(), PersistError> {
    let file = File::create(path).map_err(PersistError::io(path))?;
    write_vertices(BufWriter::new(file), vertices).map_err(PersistError::io(path))
}

/// Saves under a fresh `<nanoseconds>.draw` name in `dir`.
pub fn save_autonamed(dir: &Path, vertices: &[Vertex]) -> Result<PathBuf, PersistError> {
    write_autonamed(dir, DRAWING_EXTENSION, |out| write_vertices(out, vertices))
}

/// Creates `<nanoseconds since epoch>.<extension>` in `dir` and fills it
/// with `write`. A file that fails to write is removed again.
pub(crate) fn write_autonamed(
    dir: &Path,
    extension: &str,
    write: impl FnOnce(BufWriter<File>) -> io::Result<()>,
) -> Result<PathBuf, PersistError> {
    write_autonamed_with(dir, extension, timestamp_nanos, write)
}

fn write_autonamed_with(
    dir: &Path,
    extension: &str,
    stamp: impl FnMut() -> io::Result<u128>,
    write: impl FnOnce(BufWriter<File>) -> io::Result<()>,
) -> Result<PathBuf, PersistError> {
    let (path, file) = create_unique(dir, extension, stamp)?;
    if let Err(err) = write(BufWriter::new(file)) {
        if let Err(remove) = fs::remove_file(&path) {
            log::warn!("failed to remove {}: {remove}", path.display());
        }
        return Err(PersistError::io(&path)(err));
    }
    Ok(path)
}

/// Opens a new file named by `stamp`, sampling the next stamp whenever the
/// name is already taken.
fn create_unique(
    dir: &Path,
    extension: &str,
    mut stamp: impl FnMut() -> io::Result<u128>,
) -> Result<(PathBuf, File), PersistError> {
    loop {
        let nanos = stamp().map_err(PersistError::io(dir))?;
        let path = dir.join(format!("{nanos}.{extension}"));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(PersistError::io(&path)(err)),
        }
    }
}

fn timestamp_nanos() -> io::Result<u128> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .map_err(io::Error::other)
}

/// Packs a color the way the drawing format stores it.
pub fn pack_color(color: Color32) -> u32 {
    u32::from_be_bytes(color.to_array())
}
