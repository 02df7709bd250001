mod parser;
mod recoder;
mod runloops;
pub use parser::Feeder;
pub use recoder::build_log_config;
pub use runloops::{discover, run};
