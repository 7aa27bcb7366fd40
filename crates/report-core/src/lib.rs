pub mod config;
pub mod error;
pub mod page;
pub mod types;

pub use config::*;
pub use error::*;
pub use page::*;
pub use types::*;
