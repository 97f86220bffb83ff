use core::fmt::Display;
use gridcalc_concepts::*;

macro_rules! impl_error_variant {
    ($name: ident, $($err_var: ident),+) => {
        // Implement Display for ErrorVariant
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$err_var(message) => write!(f, "{}", message),
                    )+
                }
            }
        }
    }
}

macro_rules! impl_from_error {
    ($name: ident, $(($err_var: ident, $err_type: ty)),+) => {
        $(
            // Implement conversion from error to errorvariant
            impl From<$err_type> for $name {
                fn from(err: $err_type) -> Self {
                    $name::$err_var(err)
                }
            }
        )+
    }
}

/// Covers all errors that can occur while setting up and running a simulation.
///
/// The errors are listed from very likely to be a user error to almost certainly an internal
/// error.
#[derive(Debug)]
pub enum SimulationError {
    // Very likely to be user errors
    /// See [SetupError]
    SetupError(SetupError),
    /// See [BoundaryError]
    BoundaryError(BoundaryError),
    /// See [DecomposeError]
    DecomposeError(DecomposeError),
    /// See [TimeError]
    TimeError(TimeError),
    /// See [DegenerateDensity]
    DegenerateDensity(DegenerateDensity),

    // Less likely but possible to be user errors
    /// See [FileIoError]
    FileIoError(FileIoError),

    // Highly unlikely to be user errors
    /// See [IndexOutOfRange]
    IndexOutOfRange(IndexOutOfRange),
    /// Errors of the operating system
    IoError(std::io::Error),
    /// Thread pool could not be created
    ThreadingError(rayon::ThreadPoolBuildError),
}

impl_from_error! {SimulationError,
    (SetupError, SetupError),
    (BoundaryError, BoundaryError),
    (DecomposeError, DecomposeError),
    (TimeError, TimeError),
    (DegenerateDensity, DegenerateDensity),
    (FileIoError, FileIoError),
    (IndexOutOfRange, IndexOutOfRange),
    (IoError, std::io::Error),
    (ThreadingError, rayon::ThreadPoolBuildError)
}

impl_error_variant! {SimulationError,
    SetupError,
    BoundaryError,
    DecomposeError,
    TimeError,
    DegenerateDensity,
    FileIoError,
    IndexOutOfRange,
    IoError,
    ThreadingError
}

// Implement the general error property
impl std::error::Error for SimulationError {}

impl SimulationError {
    /// Whether the simulation state can no longer be trusted after this error.
    ///
    /// Failed plot files leave the state untouched and the run may continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SimulationError::FileIoError(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn degenerate() -> Result<(), SimulationError> {
        Err(DegenerateDensity("rho = 0 at [0, 0, 0]".to_owned()))?;
        Ok(())
    }

    #[test]
    fn convert_and_display() {
        let err = degenerate().unwrap_err();
        assert!(matches!(err, SimulationError::DegenerateDensity(_)));
        assert_eq!(format!("{}", err), "rho = 0 at [0, 0, 0]");
        assert!(err.is_fatal());
    }

    #[test]
    fn file_errors_are_not_fatal() {
        let err: SimulationError = FileIoError("disk full".to_owned()).into();
        assert!(!err.is_fatal());
        let err: SimulationError = IndexOutOfRange("[9, 9, 9]".to_owned()).into();
        assert!(err.is_fatal());
    }
}
