pub mod builder;
pub mod community;
pub mod graph;
pub mod layout;
pub mod network;
pub mod render;
pub mod scores;

pub use builder::*;
pub use community::*;
pub use graph::*;
pub use layout::*;
pub use network::*;
pub use render::*;
pub use scores::*;
