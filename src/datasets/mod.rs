pub mod augment;
mod config;
mod davis_fgbg;
mod manifest;
mod sampler;
pub mod weight;

pub use augment::{AffineParams, Geometry, Interp};
pub use config::{split_file, AugParams, LayerConfig, DAVIS_HEIGHT, DAVIS_WIDTH};
pub use davis_fgbg::{DavisFgBgLayer, Sample};
pub use manifest::{clip_id, Entry, Manifest};
pub use sampler::{FramePair, FrameSampler, SamplingMode};

/// Reads the JSON parameter block at `config_path` and sets the layer up.
pub fn get_layer<P: AsRef<std::path::Path>>(config_path: P) -> crate::Result<DavisFgBgLayer> {
    let config = LayerConfig::from_file(config_path.as_ref())?;
    log::info!(
        "Load DAVIS from {:?}, split {:?}",
        config.davis_dir,
        config.split
    );
    DavisFgBgLayer::setup(config)
}
