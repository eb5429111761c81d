//! Certificate output targets.

use crate::params::Param;
use crate::settings::ProvidedParams;

/// Output paths that each satisfy the "at least one output" requirement.
///
/// The CA chain path is deliberately absent: a chain alone is not a usable
/// certificate.
pub const OUTPUT_PATHS: [Param; 5] = [
    Param::PkiCertPath,
    Param::PkiPrivkeyPath,
    Param::PkiPembundlePath,
    Param::PkiJksPath,
    Param::PkiPkcs12Path,
];

/// Parameter named in the error when no output path is given.
pub const PRIMARY_OUTPUT: Param = Param::PkiCertPath;

/// Returns true if at least one output path is non-empty.
///
/// Keystore aliases and passwords are not inspected here.
pub fn has_any_output<P: ProvidedParams + ?Sized>(settings: &P) -> bool {
    OUTPUT_PATHS.iter().any(|param| settings.is_provided(*param))
}
