pub mod cluster_groups;
pub mod fracture_estimating;
pub mod fracture_family;
pub mod generation;
pub mod insert_shape;
pub mod network;
pub mod poly;
mod remove_fractures;
pub mod user_defined_fractures;

pub use generation::{DfnGenerator, GeneratedRadius, GenerationSummary};
pub use network::FractureNetwork;
pub use user_defined_fractures::UserFractures;
