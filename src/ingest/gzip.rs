//! Gzip container support.

use super::Unpacker;
use crate::trace::TraceFile;
use crate::utils::UnpackError;
use flate2::read::GzDecoder;
use log::debug;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflates gzip containers into a single elementary file; any other input
/// is passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipUnpacker;

impl GzipUnpacker {
    pub fn is_gzip(file: &TraceFile) -> bool {
        file.data.starts_with(&GZIP_MAGIC) || file.extension().as_deref() == Some(".gz")
    }
}

impl Unpacker for GzipUnpacker {
    fn unpack(&self, container: TraceFile) -> Result<Vec<TraceFile>, UnpackError> {
        if !Self::is_gzip(&container) {
            return Ok(vec![container]);
        }

        let mut inflated = Vec::new();
        GzDecoder::new(&container.data[..])
            .read_to_end(&mut inflated)
            .map_err(|source| UnpackError::Corrupted {
                name: container.descriptor(),
                source,
            })?;
        debug!(
            "Inflated {} ({} -> {} bytes)",
            container.name,
            container.size(),
            inflated.len()
        );

        let base = container.base_name();
        let name = base.strip_suffix(".gz").unwrap_or(base).to_string();
        Ok(vec![TraceFile::new(name, inflated).with_parent(base)])
    }
}
