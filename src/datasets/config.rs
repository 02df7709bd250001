use crate::error::{FeederError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Frame height every output is brought to.
pub const DAVIS_HEIGHT: u32 = 480;
/// Frame width every output is brought to.
pub const DAVIS_WIDTH: u32 = 854;

const NUM_TOPS: usize = 4;

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    1.0
}

fn default_tops() -> Vec<String> {
    ["data1", "data2", "label", "weight"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parameter block handed to the data layer at setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// DAVIS root, the directory holding `ImageSets/`, `JPEGImages/` and `Annotations/`
    #[serde(alias = "dataset_root")]
    pub davis_dir: PathBuf,

    /// split name, selects `ImageSets/480p/<split>.txt`
    #[serde(alias = "split_name")]
    pub split: String,

    /// per-channel mean, in BGR order
    pub mean: [f32; 3],

    /// random sampling instead of a sequential sweep
    #[serde(default = "default_true")]
    pub randomize: bool,

    /// seed for the sampling generator, entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// reserved, not applied to the outputs
    #[serde(default = "default_scale")]
    pub scale: f32,

    #[serde(default = "default_true")]
    pub with_augmentation: bool,

    /// [aug_num, max_scale, max_rotate, max_trans_w, max_trans_h, flip]
    #[serde(default)]
    pub aug_params: Option<Vec<f64>>,

    #[serde(default = "default_tops")]
    pub tops: Vec<String>,

    #[serde(default)]
    pub bottoms: Vec<String>,
}

impl LayerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FeederError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn split_file(&self) -> PathBuf {
        split_file(&self.davis_dir, &self.split)
    }

    /// Checks the connection block and the numeric parameters. Returns the
    /// parsed augmentation parameters when augmentation is enabled.
    pub fn validate(&self) -> Result<Option<AugParams>> {
        if self.tops.len() != NUM_TOPS {
            return Err(FeederError::TopArity {
                expected: NUM_TOPS,
                got: self.tops.len(),
            });
        }
        if !self.bottoms.is_empty() {
            return Err(FeederError::UnexpectedBottoms(self.bottoms.len()));
        }
        if self.split.trim().is_empty() {
            return Err(FeederError::Config("split name is empty".to_string()));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(FeederError::Config(format!(
                "mean must be finite, got {:?}",
                self.mean
            )));
        }
        if !self.with_augmentation {
            return Ok(None);
        }
        match &self.aug_params {
            Some(raw) => AugParams::from_slice(raw).map(Some),
            None => Err(FeederError::AugParams(
                "aug_params is required when with_augmentation is set".to_string(),
            )),
        }
    }
}

pub fn split_file(davis_dir: &Path, split: &str) -> PathBuf {
    davis_dir
        .join("ImageSets")
        .join("480p")
        .join(format!("{split}.txt"))
}

/// Typed view of the 6-element augmentation vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugParams {
    /// augmentation is skipped with probability 1/(aug_num+1)
    pub aug_num: u32,
    pub max_scale: f64,
    /// degrees
    pub max_rotate: f64,
    /// fraction of the frame width
    pub max_trans_w: f64,
    /// fraction of the frame height
    pub max_trans_h: f64,
    pub flip: bool,
}

impl AugParams {
    pub fn from_slice(raw: &[f64]) -> Result<Self> {
        if raw.len() != 6 {
            return Err(FeederError::AugParams(format!(
                "expected 6 values, got {}",
                raw.len()
            )));
        }
        if let Some(v) = raw.iter().find(|v| !v.is_finite()) {
            return Err(FeederError::AugParams(format!("non-finite value {v}")));
        }
        if raw[..5].iter().any(|v| *v < 0.0) {
            return Err(FeederError::AugParams(format!(
                "negative value in {raw:?}"
            )));
        }
        if raw[1] >= 1.0 {
            return Err(FeederError::AugParams(format!(
                "max_scale must be below 1, got {}",
                raw[1]
            )));
        }
        if raw[0] > u32::MAX as f64 {
            return Err(FeederError::AugParams(format!(
                "aug_num out of range: {}",
                raw[0]
            )));
        }
        Ok(Self {
            aug_num: raw[0].trunc() as u32,
            max_scale: raw[1],
            max_rotate: raw[2],
            max_trans_w: raw[3],
            max_trans_h: raw[4],
            flip: raw[5] > 0.0,
        })
    }
}
