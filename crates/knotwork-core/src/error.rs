use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnotworkError {
    #[error("Invalid knot vector: {0}")]
    InvalidKnotVector(String),

    #[error("Parameter {value} outside domain [{min}, {max}]")]
    OutOfDomain { value: f64, min: f64, max: f64 },

    #[error("Knot {knot} already has multiplicity {multiplicity} for degree {degree}")]
    KnotSaturated {
        knot: f64,
        multiplicity: usize,
        degree: usize,
    },

    #[error("Degenerate weight: {0}")]
    DegenerateWeight(f64),

    #[error("Tangent rays are parallel")]
    DegenerateRays,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Geometry error: {0}")]
    Geometry(String),
}

pub type Result<T> = std::result::Result<T, KnotworkError>;
