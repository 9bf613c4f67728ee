//! On-disk histogram container.
//!
//! Layout, little endian:
//! - header: magic `PSTC`, `u16` format version, `u32` run number, `u32` histogram count
//! - per histogram: name, title, `u8` dimension, per axis (`u32` bins, `f64` min, `f64` max, title),
//!   `f64` entries, `f64` underflow, `f64` overflow, then the contents
//! - 1D contents: one `f64` per bin
//! - 2D contents: `u32` count of filled cells, then `(u32 cell, f64 content)` pairs in ascending cell order
//!
//! Strings are a `u16` byte length followed by UTF-8 bytes.

use crate::histogram::{Axis, Bucket, Histogram1D, Histogram2D};
use crate::registry::HistogramRegistry;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// First bytes of every container
pub const MAGIC: [u8; 4] = *b"PSTC";
/// Current format version
pub const FORMAT_VERSION: u16 = 1;

/// Decoded container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    #[allow(missing_docs)]
    pub run_number: u32,
    /// Histograms in the order they were written.
    pub histograms: Vec<Bucket>,
}

impl Container {
    /// Look up a histogram by its `<KEY>_<bit>` name.
    pub fn get(&self, name: &str) -> Option<&Bucket> {
        self.histograms.iter().find(|hist| hist.name() == name)
    }
}

/// Serialize every registered bucket, in registry order.
pub fn write_container<W: Write>(
    writer: &mut W,
    run_number: u32,
    registry: &HistogramRegistry,
) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    writer.write_u32::<LittleEndian>(run_number)?;
    writer.write_u32::<LittleEndian>(registry.len() as u32)?;
    for bucket in registry.iter() {
        write_bucket(writer, bucket)?;
    }
    Ok(())
}

/// Create or overwrite the container at `path`.
pub fn write_container_file(
    path: &Path,
    run_number: u32,
    registry: &HistogramRegistry,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_container(&mut writer, run_number, registry)?;
    writer.flush()
}

fn write_bucket<W: Write>(writer: &mut W, bucket: &Bucket) -> io::Result<()> {
    write_str(writer, bucket.name())?;
    write_str(writer, bucket.title())?;
    writer.write_u8(bucket.dimension())?;
    match bucket {
        Bucket::OneD(hist) => {
            write_axis(writer, hist.axis())?;
            write_counters(writer, hist.entries(), hist.underflow(), hist.overflow())?;
            for content in hist.contents() {
                writer.write_f64::<LittleEndian>(*content)?;
            }
        }
        Bucket::TwoD(hist) => {
            write_axis(writer, hist.x_axis())?;
            write_axis(writer, hist.y_axis())?;
            write_counters(writer, hist.entries(), hist.underflow(), hist.overflow())?;
            writer.write_u32::<LittleEndian>(hist.filled_cells() as u32)?;
            for (cell, content) in hist.cells() {
                writer.write_u32::<LittleEndian>(cell)?;
                writer.write_f64::<LittleEndian>(content)?;
            }
        }
    }
    Ok(())
}

fn write_axis<W: Write>(writer: &mut W, axis: &Axis) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(axis.bins())?;
    writer.write_f64::<LittleEndian>(axis.min())?;
    writer.write_f64::<LittleEndian>(axis.max())?;
    write_str(writer, axis.title())
}

fn write_counters<W: Write>(
    writer: &mut W,
    entries: u64,
    underflow: f64,
    overflow: f64,
) -> io::Result<()> {
    writer.write_f64::<LittleEndian>(entries as f64)?;
    writer.write_f64::<LittleEndian>(underflow)?;
    writer.write_f64::<LittleEndian>(overflow)
}

fn write_str<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("String too long for container: {} bytes", s.len()),
        )
    })?;
    writer.write_u16::<LittleEndian>(len)?;
    writer.write_all(s.as_bytes())
}

/// Decode the container at `path`.
pub fn read_container(path: &Path) -> io::Result<Container> {
    let mut reader = BufReader::new(File::open(path)?);
    read_container_from(&mut reader)
}

/// Decode a container, a short read is reported as [io::ErrorKind::InvalidData].
pub fn read_container_from<R: Read>(reader: &mut R) -> io::Result<Container> {
    decode(reader).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            invalid_data("Truncated container".to_string())
        } else {
            e
        }
    })
}

fn decode<R: Read>(reader: &mut R) -> io::Result<Container> {
    let mut magic = [0_u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(invalid_data(format!("Bad magic: {magic:?}")));
    }
    let version = reader.read_u16::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(invalid_data(format!(
            "Unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    let run_number = reader.read_u32::<LittleEndian>()?;
    let count = reader.read_u32::<LittleEndian>()?;
    let histograms = (0..count)
        .map(|_| read_bucket(reader))
        .collect::<io::Result<Vec<Bucket>>>()?;

    let mut trailing = [0_u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(invalid_data("Trailing bytes after last histogram".to_string()));
    }
    Ok(Container {
        run_number,
        histograms,
    })
}

fn read_bucket<R: Read>(reader: &mut R) -> io::Result<Bucket> {
    let name = read_str(reader)?;
    let title = read_str(reader)?;
    match reader.read_u8()? {
        1 => {
            let axis = read_axis(reader)?;
            let (entries, underflow, overflow) = read_counters(reader)?;
            let contents = (0..axis.bins())
                .map(|_| reader.read_f64::<LittleEndian>())
                .collect::<io::Result<Vec<f64>>>()?;
            Histogram1D::from_parts(&name, &title, axis, contents, underflow, overflow, entries)
                .map(Bucket::OneD)
                .ok_or_else(|| invalid_data(format!("{name}: contents do not match the axis")))
        }
        2 => {
            let x_axis = read_axis(reader)?;
            let y_axis = read_axis(reader)?;
            let (entries, underflow, overflow) = read_counters(reader)?;
            let filled = reader.read_u32::<LittleEndian>()?;
            let mut cells = BTreeMap::new();
            for _ in 0..filled {
                let cell = reader.read_u32::<LittleEndian>()?;
                let content = reader.read_f64::<LittleEndian>()?;
                if cells.insert(cell, content).is_some() {
                    return Err(invalid_data(format!("{name}: cell {cell} stored twice")));
                }
            }
            Histogram2D::from_parts(
                &name,
                &title,
                (x_axis, y_axis),
                cells,
                underflow,
                overflow,
                entries,
            )
            .map(Bucket::TwoD)
            .ok_or_else(|| invalid_data(format!("{name}: cell outside the grid")))
        }
        dimension => Err(invalid_data(format!(
            "{name}: invalid dimension {dimension}"
        ))),
    }
}

fn read_axis<R: Read>(reader: &mut R) -> io::Result<Axis> {
    let bins = reader.read_u32::<LittleEndian>()?;
    let min = reader.read_f64::<LittleEndian>()?;
    let max = reader.read_f64::<LittleEndian>()?;
    let title = read_str(reader)?;
    if bins == 0 || min.is_nan() || max.is_nan() || min >= max {
        return Err(invalid_data(format!(
            "Invalid axis '{title}': {bins} bins over [{min}, {max})"
        )));
    }
    Ok(Axis::new(bins, min, max, &title))
}

fn read_counters<R: Read>(reader: &mut R) -> io::Result<(u64, f64, f64)> {
    let entries = reader.read_f64::<LittleEndian>()?;
    let underflow = reader.read_f64::<LittleEndian>()?;
    let overflow = reader.read_f64::<LittleEndian>()?;
    Ok((entries as u64, underflow, overflow))
}

fn read_str<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = reader.read_u16::<LittleEndian>()?;
    let mut buf = vec![0_u8; usize::from(len)];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| invalid_data(format!("Invalid UTF-8 string: {e}")))
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
