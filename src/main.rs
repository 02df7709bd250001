use clap::Parser;
use segflow_davis::core;
use segflow_davis::datasets::LayerConfig;

fn main() -> anyhow::Result<()> {
    let fd = core::Feeder::parse();
    let config = LayerConfig::from_file(&fd.config)?;
    let _log_handle = log4rs::init_config(core::build_log_config(&fd, &config)?)?;

    if fd.discover {
        core::discover(&config)?;
    } else {
        core::run(&fd, config)?;
    }

    log::debug!("{:?}", fd);
    Ok(())
}
