pub mod constants;
pub mod logging;

pub use constants::*;
pub use logging::{DEFAULT_LOG_FILTER, init_logging, log_file_name};
