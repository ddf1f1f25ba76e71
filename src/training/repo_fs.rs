//! Filesystem storage for fitted pipelines.
//!
//! An artifact is a 16-byte header followed by a postcard payload holding the
//! training schema and the fitted pipeline.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("HYML")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       2     Reserved
//! 8       4     Payload size (bytes)
//! 12      4     CRC32 checksum of payload
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::error::HyperResult;
use crate::data::Schema;
use crate::pipeline::FittedPipeline;

pub const MAGIC: &[u8; 4] = b"HYML";
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;
pub const HEADER_SIZE: usize = 16;

/// Malformed or incompatible artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("not a model artifact")]
    NotAModel,

    #[error("artifact requires format {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("artifact truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(postcard::Error),

    #[error("decoding error: {0}")]
    Decoding(postcard::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version_major: u8,
    version_minor: u8,
    payload_size: u32,
    checksum: u32,
}

impl Header {
    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Result<Self, ArtifactError> {
        if buf.len() < HEADER_SIZE {
            return Err(if buf.len() >= 4 && &buf[0..4] != MAGIC {
                ArtifactError::NotAModel
            } else {
                ArtifactError::Truncated {
                    expected: HEADER_SIZE,
                    actual: buf.len(),
                }
            });
        }
        if &buf[0..4] != MAGIC {
            return Err(ArtifactError::NotAModel);
        }
        let (version_major, version_minor) = (buf[4], buf[5]);
        if version_major > VERSION_MAJOR {
            return Err(ArtifactError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }
        Ok(Self {
            version_major,
            version_minor,
            payload_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            checksum: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    schema: &'a Schema,
    pipeline: &'a FittedPipeline,
}

#[derive(Deserialize)]
struct Payload {
    schema: Schema,
    pipeline: FittedPipeline,
}

/// Encode `schema` and `pipeline` into artifact bytes.
pub fn encode(schema: &Schema, pipeline: &FittedPipeline) -> Result<Vec<u8>, ArtifactError> {
    let payload = postcard::to_allocvec(&PayloadRef { schema, pipeline })
        .map_err(ArtifactError::Encoding)?;
    let header = Header {
        version_major: VERSION_MAJOR,
        version_minor: VERSION_MINOR,
        payload_size: payload.len() as u32,
        checksum: crc32fast::hash(&payload),
    };
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode artifact bytes into the stored schema and pipeline.
pub fn decode(bytes: &[u8]) -> Result<(Schema, FittedPipeline), ArtifactError> {
    let header = Header::from_bytes(bytes)?;
    let expected = HEADER_SIZE + header.payload_size as usize;
    if bytes.len() < expected {
        return Err(ArtifactError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    let payload = &bytes[HEADER_SIZE..expected];
    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(ArtifactError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }
    match postcard::from_bytes::<Payload>(payload) {
        Ok(Payload { schema, pipeline }) => Ok((schema, pipeline)),
        Err(err) => Err(ArtifactError::Decoding(err)),
    }
}

/// Write an artifact to `path`, replacing any existing file.
pub fn save_pipeline(path: &Path, schema: &Schema, pipeline: &FittedPipeline) -> HyperResult<()> {
    let bytes = encode(schema, pipeline)?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

/// Read an artifact from `path`.
pub fn load_pipeline(path: &Path) -> HyperResult<(Schema, FittedPipeline)> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    Ok(decode(&bytes)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::{Cell, ColumnData, ColumnDef, ColumnKind, DataView};
    use crate::pipeline::{EstimatorChain, EstimatorStage};

    fn fixture() -> (Schema, FittedPipeline) {
        let mut view = DataView::new(3);
        view.put(
            "label",
            ColumnData::Cells(vec![
                Cell::Text("a".into()),
                Cell::Text("b".into()),
                Cell::Missing,
            ]),
        )
        .unwrap();
        let pipeline = EstimatorChain::new()
            .append(EstimatorStage::MapValueToKey {
                column: "label".into(),
            })
            .fit(&view)
            .unwrap();
        let schema = Schema {
            columns: vec![ColumnDef {
                name: "label".into(),
                kind: ColumnKind::Text,
            }],
        };
        (schema, pipeline)
    }

    #[test]
    fn artifact_round_trip_keeps_schema_and_stages() {
        let (schema, pipeline) = fixture();
        let bytes = encode(&schema, &pipeline).unwrap();
        assert_eq!(&bytes[0..4], MAGIC);

        let (loaded_schema, loaded) = decode(&bytes).unwrap();
        assert_eq!(loaded_schema, schema);
        assert_eq!(loaded, pipeline);
        assert!(!Arc::ptr_eq(&loaded.stages()[0], &pipeline.stages()[0]));
    }

    #[test]
    fn wrong_magic_is_not_a_model() {
        let (schema, pipeline) = fixture();
        let mut bytes = encode(&schema, &pipeline).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(ArtifactError::NotAModel)));
    }

    #[test]
    fn corrupted_payload_fails_the_checksum() {
        let (schema, pipeline) = fixture();
        let mut bytes = encode(&schema, &pipeline).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(ArtifactError::ChecksumMismatch { .. })));
    }

    #[test]
    fn short_files_are_truncated() {
        let (schema, pipeline) = fixture();
        let bytes = encode(&schema, &pipeline).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 2]),
            Err(ArtifactError::Truncated { .. })
        ));
        assert!(matches!(decode(&bytes[..3]), Err(ArtifactError::Truncated { .. })));
    }

    #[test]
    fn newer_major_versions_are_rejected() {
        let (schema, pipeline) = fixture();
        let mut bytes = encode(&schema, &pipeline).unwrap();
        bytes[4] = VERSION_MAJOR + 1;
        assert!(matches!(
            decode(&bytes),
            Err(ArtifactError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn files_round_trip_through_disk() {
        let (schema, pipeline) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.hyml");
        save_pipeline(&path, &schema, &pipeline).unwrap();
        let (_, loaded) = load_pipeline(&path).unwrap();
        assert_eq!(loaded, pipeline);
    }
}
