//! Label CSV output.
//!
//! One `data.csv` per batch directory:
//!
//! ```text
//! base_path,piece_id,corner_1_x,corner_1_y,...,corner_4_x,corner_4_y
//! Materials/Base/cat.jpg,0,0.41,0.52,...
//! ```
//!
//! Floats use `Display`, which prints the shortest string that parses back
//! to the same value.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::uv::{CornerLabels, NUM_CORNERS};

/// Name of the label file inside each batch directory.
pub const LABEL_FILE: &str = "data.csv";

/// Header row.
pub fn header() -> String {
    let mut cols = vec!["base_path".to_string(), "piece_id".to_string()];
    for i in 1..=NUM_CORNERS {
        cols.push(format!("corner_{}_x", i));
        cols.push(format!("corner_{}_y", i));
    }
    cols.join(",")
}

/// One label row without the trailing newline.
pub fn format_row(base_path: &Path, piece_id: usize, labels: &CornerLabels) -> String {
    let mut row = format!("{},{}", escape(&base_path.display().to_string()), piece_id);
    for value in labels.flatten() {
        row.push(',');
        row.push_str(&value.to_string());
    }
    row
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Streams label rows to a CSV file.
///
/// The header is written on creation. Rows are buffered; call
/// [`LabelWriter::flush`] to push them to disk. Dropping the writer also
/// flushes, ignoring errors.
pub struct LabelWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl LabelWriter {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{}", header())?;
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// Append one row.
    pub fn write(&mut self, base_path: &Path, piece_id: usize, labels: &CornerLabels) -> Result<()> {
        writeln!(self.writer, "{}", format_row(base_path, piece_id, labels))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn labels() -> CornerLabels {
        CornerLabels {
            corners: [
                Point2::new(0.1, 0.2),
                Point2::new(0.3, 0.2),
                Point2::new(0.3, 0.4),
                Point2::new(0.1, 0.4),
            ],
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(
            header(),
            "base_path,piece_id,corner_1_x,corner_1_y,corner_2_x,corner_2_y,\
             corner_3_x,corner_3_y,corner_4_x,corner_4_y"
        );
    }

    #[test]
    fn test_row_uses_shortest_floats() {
        let row = format_row(Path::new("Base/cat.jpg"), 3, &labels());
        assert_eq!(row, "Base/cat.jpg,3,0.1,0.2,0.3,0.2,0.3,0.4,0.1,0.4");
    }

    #[test]
    fn test_path_with_comma_is_quoted() {
        let row = format_row(Path::new("a,b.png"), 0, &labels());
        assert!(row.starts_with("\"a,b.png\",0,"));
    }

    #[test]
    fn test_writer_flushes_rows() {
        let path = std::env::temp_dir().join(format!("jigsaw_labels_{}.csv", std::process::id()));
        let mut writer = LabelWriter::create(&path).unwrap();
        writer.write(Path::new("x.png"), 0, &labels()).unwrap();
        writer.write(Path::new("x.png"), 1, &labels()).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.rows(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], header());
        assert!(lines[2].starts_with("x.png,1,"));
    }
}
