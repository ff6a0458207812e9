//! Where field list text comes from and how its bytes are decoded.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use super::{parse_fields, FieldTable};
use crate::error::{Error, Result};

/// Encoding used when none is given.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// A field list to be read: a file, or standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Field list stored in a file
    File(PathBuf),
    /// Field list piped on standard input
    Stdin,
}

impl FieldSource {
    /// File source when a path is given, stdin otherwise.
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) => FieldSource::File(p.to_path_buf()),
            None => FieldSource::Stdin,
        }
    }

    /// Read the whole source and decode it with the encoding named by `label`.
    pub fn read_to_string(&self, label: &str) -> Result<String> {
        let bytes = match self {
            FieldSource::File(path) => {
                let mut file = File::open(path).map_err(|e| Error::from_open(e, path))?;
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)?;
                bytes
            },
            FieldSource::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin().lock().read_to_end(&mut bytes)?;
                bytes
            },
        };
        log::debug!("read {} bytes of field list from {:?}", bytes.len(), self);
        decode(&bytes, label)
    }

    /// Read, decode and parse the source.
    pub fn read_fields(&self, label: &str) -> Result<FieldTable> {
        let text = self.read_to_string(label)?;
        Ok(parse_fields(&text))
    }
}

/// Decode `bytes` in the encoding named by `label` (a WHATWG label such as
/// `utf-8`, `windows-1251` or `koi8-r`).
///
/// A BOM of the declared encoding is dropped. Malformed input is an error,
/// never silently replaced.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;

    let bytes = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| Error::Encoding(encoding.name().to_string()))
}
