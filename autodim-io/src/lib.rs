use std::fs;
use std::path::Path;

use autodim_core::document::Document;
use thiserror::Error;
use tracing::info;

mod reader;
mod writer;

use reader::{DxfError, DxfParser};
pub use writer::{DIMENSION_LAYER, DxfDimensionWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

fn map_dxf_error(err: DxfError) -> IoError {
    match err {
        DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
        DxfError::Invalid { message } => IoError::InvalidDocument(message),
    }
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 直接解析内存中的 DXF 文本。
    pub fn parse_str(&self, source: &str) -> Result<Document, IoError> {
        DxfParser::new(source).parse().map_err(map_dxf_error)
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document = self.parse_str(&data)?;
        info!(path = %path.display(), entities = document.len(), "DXF 已读取");
        Ok(document)
    }
}

impl DocumentSaver for DxfFacade {
    /// 只写出几何，不附带标注。
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        DxfDimensionWriter::default().save(document, path)
    }
}
