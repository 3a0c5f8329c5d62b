//! ZIP container for the parts of a presentation package.

use deck_core::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Writes package parts into an in-memory ZIP archive.
///
/// Every entry gets the same fixed timestamp so identical input produces
/// identical bytes.
pub struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    written: HashSet<String>,
}

impl PackageWriter {
    /// Create an empty package.
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            written: HashSet::new(),
        }
    }

    /// Write a part. Part names have no leading `/`.
    pub fn add_part(&mut self, part_name: &str, data: &[u8]) -> Result<()> {
        if !self.written.insert(part_name.to_string()) {
            return Err(Error::ZipError(format!("Duplicate part '{}'", part_name)));
        }

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        self.zip
            .start_file(part_name, options)
            .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", part_name, e)))?;
        self.zip
            .write_all(data)
            .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", part_name, e)))?;

        Ok(())
    }

    /// Write an XML part.
    pub fn add_xml(&mut self, part_name: &str, xml: &str) -> Result<()> {
        self.add_part(part_name, xml.as_bytes())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

impl Default for PackageWriter {
    fn default() -> Self {
        Self::new()
    }
}
