use drude::DrudeError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TholeError {
    #[error("illegal pair_thole settings: {0}")]
    IllegalArguments(String),

    #[error("incorrect args for pair coefficients: {0}")]
    IncorrectCoeffArgs(String),

    #[error("numeric index '{token}' is out of bounds 1..={ntypes}")]
    InvalidBounds { token: String, ntypes: usize },

    #[error("expected a floating point number, found '{0}'")]
    Parse(String),

    #[error("pair style thole requires the atom charge attribute")]
    MissingCharge,

    #[error("pair coefficients of types {itype} {jtype} are not set and cannot be mixed")]
    CoeffsNotSet { itype: usize, jtype: usize },

    #[error("pair style thole is used before init")]
    NotInitialized,

    #[error(transparent)]
    Drude(#[from] DrudeError),
}
