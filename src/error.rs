#[derive(thiserror::Error, Debug)]
pub enum DfngenError {
    #[error(transparent)]
    SystemTime(#[from] std::time::SystemTimeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    DistrUniform(#[from] rand::distr::uniform::Error),
    #[error(transparent)]
    DistrNormal(#[from] rand_distr::NormalError),
    #[error(transparent)]
    Sampling(#[from] crate::distribution::SamplingError),
    #[error(transparent)]
    TextIo(#[from] text_io::Error),
    #[error(transparent)]
    ExponentialSampling(#[from] crate::distribution::exp::Error),

    #[error("variable not found in input file: {0}")]
    MissingVariable(String),
    #[error("unable to parse value for {name} {value:?}")]
    ParseValue { name: String, value: String },
    #[error("invalid value for {name} {value}")]
    InvalidOption { name: String, value: String },
    #[error("{name} expects {expected} values, found {found}")]
    ArrayLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{family}: layer and region both defined for this family")]
    LayerAndRegion { family: String },
    #[error("{family}: {what} {index} is not defined")]
    UndefinedLayerOrRegion {
        family: String,
        what: &'static str,
        index: usize,
    },
    #[error("{family}: {reason}")]
    InvalidFamily { family: String, reason: String },
    #[error(
        "{family} is generating too many fractures with radii less than 3*h (minimum radius), adjust the distribution parameters"
    )]
    TooManySmallFractures { family: String },
    #[error(
        "DFN generation has finished, however there are no intersecting fractures. Try increasing the fracture density, or shrinking the domain"
    )]
    NoFractures,
    #[error(
        "DFN generation has finished but the formed fracture network does not make a connection between the specified boundary faces. Try increasing the fracture density, shrinking the domain or consider using the 'ignoreBoundaryFaces' option"
    )]
    NoBoundaryConnection,
}
