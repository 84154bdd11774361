//! Stochastic discrete fracture network generation.
//!
//! Fractures are drawn from families (or read from user files), truncated against the
//! domain and accepted only when FRAM finds every intersection they form resolvable
//! at the minimum feature size `h`.

pub mod computational_geometry;
pub mod distribution;
pub mod error;
pub mod fracture;
pub mod io;
pub mod math_functions;
pub mod structures;

pub use error::DfngenError;
pub use fracture::{DfnGenerator, FractureNetwork, GenerationSummary};
pub use io::input::{read_input, Input};
pub use io::output::write_output;
