pub mod collection;
pub mod config_manager;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod progress;

pub use collection::*;
pub use config_manager::*;
pub use dataset::*;
pub use error::*;
pub use identity::*;
pub use progress::*;
