use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "DAVIS2016 fg/bg frame-pair feeder")]
#[command(version = "0.1")]
#[command(about = "Sample augmented frame pairs, labels and weight maps from DAVIS2016", long_about = None)]
pub struct Feeder {
    /// Name of this run
    #[arg(short, long)]
    pub name: String,

    /// JSON parameter block of the data layer
    #[arg(short, long)]
    pub config: String,

    /// number of samples to draw
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..), default_value_t = 10)]
    pub steps: u32,

    /// write the split file from the JPEGImages/Annotations tree and exit
    #[arg(long, default_value_t = false)]
    pub discover: bool,

    /// lowest level echoed to stderr, the log file always keeps trace
    #[arg(short, long, default_value_t = log::LevelFilter::Info)]
    pub log_level: log::LevelFilter,

    /// recoder home path
    #[arg(short, long, default_value_t = String::from("tmp"))]
    pub recoder_home: String,
}
