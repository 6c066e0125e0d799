use std::path::PathBuf;

use thiserror::Error;

/// Everything that aborts the analysis of an input file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a wasm module: bad magic 0x{0:08x}")]
    BadWasmMagic(u32),

    #[error("unsupported wasm version {0}")]
    BadWasmVersion(u32),

    #[error("unexpected end of input at byte offset {0}")]
    Truncated(usize),

    #[error("varint at byte offset {0} does not fit in 32 bits")]
    VarintOverflow(usize),

    #[error("wasm section at byte offset {offset} ends at {end}, past the end of the file ({file_size} bytes)")]
    SectionOverrun {
        offset: usize,
        end: usize,
        file_size: usize,
    },

    #[error("malformed name section: sub-sections end at {actual}, section ends at {expected}")]
    MalformedNameSection { expected: usize, actual: usize },

    #[error("table import at byte offset {offset} has element type 0x{found:02x}, expected 0x70")]
    BadTableElementType { offset: usize, found: u8 },

    #[error("memory limits at byte offset {offset} use unknown flag 0x{found:02x}")]
    BadLimitsFlag { offset: usize, found: u8 },

    #[error("unsupported syntax `{kind}` at byte offset {offset}")]
    UnsupportedNode { kind: &'static str, offset: u32 },

    #[error("failed to parse JavaScript: {0}")]
    Parse(String),

    #[error("invalid base64 VLQ character {0:?} in source map mappings")]
    InvalidVlq(char),

    #[error("failed to start the analysis threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("creating a symbol map from a source map needs exactly one input JavaScript file, got {0}")]
    SymbolMapInputCount(usize),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
