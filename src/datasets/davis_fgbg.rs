use super::augment::{self, Geometry, Interp};
use super::config::{AugParams, LayerConfig, DAVIS_HEIGHT, DAVIS_WIDTH};
use super::manifest::{self, Manifest};
use super::sampler::{FramePair, FrameSampler, SamplingMode};
use super::weight;
use crate::error::{FeederError, Result};
use candle_core::{Device, Tensor};
use image::GrayImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// One training sample: two frames of the same clip, the label of the
/// first frame and its weight map.
#[derive(Debug, Clone)]
pub struct Sample {
    pub pair: FramePair,
    pub geometry: Geometry,
    /// (1, 3, H, W), BGR minus mean
    pub frame1: Tensor,
    /// (1, 3, H, W), BGR minus mean
    pub frame2: Tensor,
    /// (1, H, W), values in {0, 1}
    pub label: Tensor,
    /// (1, H, W)
    pub weight: Tensor,
    pub class_weights: Vec<f32>,
}

impl Sample {
    pub fn shapes(&self) -> [Vec<usize>; 4] {
        [
            self.frame1.dims().to_vec(),
            self.frame2.dims().to_vec(),
            self.label.dims().to_vec(),
            self.weight.dims().to_vec(),
        ]
    }
}

/// Loads (frame1, frame2, label, weight) from DAVIS2016, one sample per
/// `reshape`. frame2 is frame1 at the end of each clip.
pub struct DavisFgBgLayer {
    config: LayerConfig,
    aug: Option<AugParams>,
    manifest: Manifest,
    sampler: FrameSampler,
    rng: ChaCha8Rng,
    width: u32,
    height: u32,
    device: Device,
    current: Option<Sample>,
}

impl DavisFgBgLayer {
    /// Validates the parameter block and reads the split file.
    pub fn setup(config: LayerConfig) -> Result<Self> {
        let aug = config.validate()?;
        let manifest = Manifest::load(config.split_file())?;
        Self::build(config, aug, manifest)
    }

    pub fn with_manifest(config: LayerConfig, manifest: Manifest) -> Result<Self> {
        let aug = config.validate()?;
        Self::build(config, aug, manifest)
    }

    fn build(config: LayerConfig, aug: Option<AugParams>, manifest: Manifest) -> Result<Self> {
        if (config.scale - 1.0).abs() > f32::EPSILON {
            log::warn!("scale {} is reserved and not applied", config.scale);
        }
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mode = if config.randomize {
            SamplingMode::Random
        } else {
            SamplingMode::Sequential
        };
        let sampler = FrameSampler::new(mode, manifest.len(), &mut rng);
        log::info!(
            "DAVIS fg/bg layer: split {:?}, {} entries, {:?} sampling, augmentation {:?}",
            config.split,
            manifest.len(),
            sampler.mode(),
            aug
        );
        Ok(Self {
            config,
            aug,
            manifest,
            sampler,
            rng,
            width: DAVIS_WIDTH,
            height: DAVIS_HEIGHT,
            device: Device::Cpu,
            current: None,
        })
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Draws the next sample and returns the four top shapes.
    pub fn reshape(&mut self) -> Result<[Vec<usize>; 4]> {
        let sample = self.sample()?;
        let shapes = sample.shapes();
        self.current = Some(sample);
        Ok(shapes)
    }

    /// Tops of the last `reshape`: frame1, frame2, label, weight.
    pub fn forward(&self) -> Result<[Tensor; 4]> {
        let s = self.current.as_ref().ok_or(FeederError::NotReshaped)?;
        Ok([
            s.frame1.clone(),
            s.frame2.clone(),
            s.label.clone(),
            s.weight.clone(),
        ])
    }

    /// Data layers propagate nothing.
    pub fn backward(&self) {}

    pub fn current(&self) -> Option<&Sample> {
        self.current.as_ref()
    }

    pub fn sample(&mut self) -> Result<Sample> {
        let pair = self
            .sampler
            .next_pair(&self.manifest, &mut self.rng)
            .ok_or(FeederError::NoUsableSample(self.manifest.len()))?;
        let geometry = Geometry::draw(self.aug.as_ref(), self.width, self.height, &mut self.rng);

        let entries = (self.manifest.get(pair.first), self.manifest.get(pair.second));
        let (first, second) = match entries {
            (Some(a), Some(b)) => (a.clone(), b.clone()),
            _ => return Err(FeederError::NoUsableSample(self.manifest.len())),
        };
        if let Geometry::Affine(p) = &geometry {
            log::debug!("pair ({}, {}) augmented, {}", pair.first, pair.second, p);
        } else {
            log::debug!("pair ({}, {}) resized", pair.first, pair.second);
        }

        let (h, w) = (self.height as usize, self.width as usize);
        let frame1 = self.load_frame(&first.image, &geometry)?;
        let frame2 = self.load_frame(&second.image, &geometry)?;
        let mask = self.load_label(&first.label, &geometry)?;

        let weights = weight::class_balanced_weights(mask.as_raw());
        for (c, v) in weights.class_weights.iter().enumerate() {
            log::trace!("Class {c}, weight = {v}");
        }
        let label: Vec<f32> = mask.as_raw().iter().map(|&v| v as f32).collect();

        Ok(Sample {
            pair,
            geometry,
            frame1: Tensor::from_vec(frame1, (1, 3, h, w), &self.device)?,
            frame2: Tensor::from_vec(frame2, (1, 3, h, w), &self.device)?,
            label: Tensor::from_vec(label, (1, h, w), &self.device)?,
            weight: Tensor::from_vec(weights.values, (1, h, w), &self.device)?,
            class_weights: weights.class_weights,
        })
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        manifest::resolve(&self.config.davis_dir, relative)
    }

    fn open(&self, relative: &str) -> Result<image::DynamicImage> {
        let path = self.resolve(relative);
        log::debug!("loading {:?}", path);
        image::open(&path).map_err(|source| FeederError::Image { path, source })
    }

    fn load_frame(&self, relative: &str, geometry: &Geometry) -> Result<Vec<f32>> {
        let rgb = self.open(relative)?.to_rgb8();
        let out = augment::warp(&rgb, geometry, Interp::Bilinear, self.width, self.height);
        Ok(augment::frame_to_chw(&out, self.config.mean))
    }

    fn load_label(&self, relative: &str, geometry: &Geometry) -> Result<GrayImage> {
        let raw = augment::label_values(&self.open(relative)?);
        let mut mask = augment::warp(&raw, geometry, Interp::Nearest, self.width, self.height);
        augment::binarize(&mut mask);
        log::debug!(
            "Number of Objects: {}",
            mask.as_raw().iter().max().copied().unwrap_or(0)
        );
        Ok(mask)
    }
}
