pub mod config;
pub mod error;
pub mod options;
pub mod value;

pub use config::*;
pub use error::*;
pub use options::*;
pub use value::*;
