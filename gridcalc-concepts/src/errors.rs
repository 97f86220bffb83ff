use core::fmt::Display;
use std::error::Error;

macro_rules! define_errors {
    ($(($err_name: ident, $err_descr: expr)),+) => {
        $(
            #[doc = $err_descr]
            #[derive(Debug,Clone)]
            pub struct $err_name(
                #[doc = "Error message associated with "]
                #[doc = stringify!($err_name)]
                #[doc = " error type."]
                pub String,
            );

            impl Display for $err_name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl Error for $err_name {}
        )+
    }
}

/// Error during decomposition of a global domain into multiple partitions
#[derive(Clone, Debug)]
pub enum DecomposeError {
    /// Generic error encountered during domain-decomposition
    Generic(String),
    /// [BoundaryError] which is encountered during domain-decomposition
    BoundaryError(BoundaryError),
    /// [IndexOutOfRange] encountered during domain-decomposition
    IndexOutOfRange(IndexOutOfRange),
}

impl Display for DecomposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DecomposeError::Generic(message) => write!(f, "{}", message),
            DecomposeError::BoundaryError(err) => write!(f, "{}", err),
            DecomposeError::IndexOutOfRange(err) => write!(f, "{}", err),
        }
    }
}

impl Error for DecomposeError {}

impl From<BoundaryError> for DecomposeError {
    fn from(value: BoundaryError) -> Self {
        DecomposeError::BoundaryError(value)
    }
}

impl From<IndexOutOfRange> for DecomposeError {
    fn from(value: IndexOutOfRange) -> Self {
        DecomposeError::IndexOutOfRange(value)
    }
}

define_errors!(
    (SetupError, "Occurs during setup of a new simulation"),
    (
        TimeError,
        "Error related to advancing the simulation steps or displaying its progress"
    ),
    (
        IndexOutOfRange,
        "Checked access outside of the ghost-extended box or the valid component range"
    ),
    (
        DegenerateDensity,
        "Zero, near-zero or non-finite density encountered while computing macroscopic moments"
    ),
    (
        FileIoError,
        "A stage of writing a plot file (open, grid, solution or close) did not complete"
    ),
    (BoundaryError, "Can occur during construction of boxes and domain boundaries")
);

impl From<String> for TimeError {
    fn from(value: String) -> Self {
        TimeError(value)
    }
}

impl From<std::io::Error> for FileIoError {
    fn from(value: std::io::Error) -> Self {
        FileIoError(format!("{}", value))
    }
}

impl From<BoundaryError> for SetupError {
    fn from(value: BoundaryError) -> Self {
        SetupError(format!("{}", value))
    }
}

impl From<DecomposeError> for SetupError {
    fn from(value: DecomposeError) -> Self {
        SetupError(format!("{}", value))
    }
}
