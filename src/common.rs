pub mod cache;
pub mod console;
pub mod error;
pub mod log;
pub mod utils;
