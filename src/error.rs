use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeederError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid parameter block: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("need to define {expected} tops (data1, data2, label, weight), got {got}")]
    TopArity { expected: usize, got: usize },

    #[error("data layer takes no bottoms, got {0}")]
    UnexpectedBottoms(usize),

    #[error("malformed aug_params: {0}")]
    AugParams(String),

    #[error("manifest {path:?} line {line}: {reason}")]
    Manifest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("forward called before reshape")]
    NotReshaped,

    #[error("manifest of {0} entries has no usable primary frame")]
    NoUsableSample(usize),
}

pub type Result<T> = std::result::Result<T, FeederError>;
