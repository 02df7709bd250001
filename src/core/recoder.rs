use crate::core::parser::Feeder;
use crate::datasets::LayerConfig;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use std::path::PathBuf;

/// `<split>-seed<seed>`, or `<split>-entropy` for unseeded runs.
pub fn run_tag(config: &LayerConfig) -> String {
    match config.seed {
        Some(seed) => format!("{}-seed{seed}", config.split),
        None => format!("{}-entropy", config.split),
    }
}

/// `<recoder_home>/<name>/<tag>--<timestamp>.log`
pub fn log_file_path(feeder: &Feeder, tag: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m-%d--%H:%M:%S");
    PathBuf::from(&feeder.recoder_home)
        .join(&feeder.name)
        .join(format!("{tag}--{stamp}.log"))
}

/// stderr gets `--log-level` and above; the file keeps everything down to
/// trace (per-class weights, transform parameters).
pub fn build_log_config(
    feeder: &Feeder,
    config: &LayerConfig,
) -> anyhow::Result<log4rs::Config> {
    let log_path = log_file_path(feeder, &run_tag(config));
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%+)(utc)} [{f}:{L}] {h({l})} -> {m}{n}",
        )))
        .build(log_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(feeder.log_level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("logfile")
                .appender("stderr")
                .build(log::LevelFilter::Trace),
        )?;

    Ok(config)
}
