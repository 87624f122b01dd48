//! Format versions written into serialized quadratic-residue keys.

use serde::de::Error as DeError;

pub const QUADRATIC_PUBLIC_KEY_VERSION: u16 = 1;
pub const QUADRATIC_PRIVATE_KEY_VERSION: u16 = 1;

/// Rejects any key whose `version` field differs from the one this build writes.
pub fn expect_version<E: DeError>(found: u16, expected: u16, label: &'static str) -> Result<(), E> {
    if found == expected {
        Ok(())
    } else {
        Err(E::custom(format_args!(
            "unsupported {label} format version {found}, this build reads {expected}"
        )))
    }
}
