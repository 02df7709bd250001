use crate::core::Feeder;
use crate::datasets::{clip_id, DavisFgBgLayer, LayerConfig, Manifest};
use std::time::Instant;

pub fn run(fd: &Feeder, config: LayerConfig) -> anyhow::Result<()> {
    let mut layer = DavisFgBgLayer::setup(config)?;
    log::info!(
        "Feeding {} steps from {:?}, split {:?}, seed {:?}",
        fd.steps,
        layer.config().davis_dir,
        layer.config().split,
        layer.config().seed
    );
    let total_time = Instant::now();
    for step in 0..fd.steps {
        let loop_time = Instant::now();
        let shapes = layer.reshape()?;
        let [_frame1, _frame2, label, weight] = layer.forward()?;
        let fg = label.mean_all()?.to_vec0::<f32>()?;
        let mean_weight = weight.mean_all()?.to_vec0::<f32>()?;

        if let Some(sample) = layer.current() {
            let clip = layer
                .manifest()
                .get(sample.pair.first)
                .map(|e| clip_id(&e.image).to_string())
                .unwrap_or_default();
            log::info!(
                "Step {step:3} -> clip {clip:?}, pair ({}, {}), augmented: {}, foreground: {:5.2}%, mean weight: {mean_weight:.4}, time: {:5.2?}",
                sample.pair.first,
                sample.pair.second,
                sample.geometry.is_augmented(),
                fg * 100.0,
                loop_time.elapsed()
            );
        }
        log::debug!("Step {step:3} -> top shapes {shapes:?}");
    }
    log::info!(
        "Sampled {} pairs in {:5.2?}",
        fd.steps,
        total_time.elapsed()
    );
    Ok(())
}

/// Writes `ImageSets/480p/<split>.txt` from the dataset tree named in the
/// config.
pub fn discover(config: &LayerConfig) -> anyhow::Result<()> {
    let manifest = Manifest::discover(&config.davis_dir)?;
    if manifest.is_empty() {
        anyhow::bail!("no annotated frames found under {:?}", config.davis_dir);
    }
    let split = config.split_file();
    manifest.write(&split)?;
    log::info!("Wrote {} entries to {:?}", manifest.len(), split);
    Ok(())
}
