pub mod config;
pub mod error;
pub mod rate;

pub use config::*;
pub use error::*;
pub use rate::*;
