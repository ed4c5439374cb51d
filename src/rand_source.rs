//! Random byte sources for node identifiers, clock sequence seeds, and random UUID fields

use log::error;
use rand::{rngs::OsRng, RngCore};

use crate::error::EntropyError;

/// A trait that defines the random number generator interface consumed by
/// [`Generator`](crate::Generator) and [`ClockSequence`](crate::ClockSequence).
///
/// Implementations must be cryptographically strong and safe to call from multiple threads at
/// once. A failing source must report the failure instead of returning partially filled or
/// predictable data; the generator treats [`EntropyError`] as fatal for the current operation.
pub trait RandomSource: Send + Sync {
    /// Replaces the whole content of `dest` with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

impl<T: RandomSource + ?Sized> RandomSource for &T {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        (**self).fill(dest)
    }
}

/// The default [`RandomSource`] that reads from the operating system's CSPRNG through
/// [`OsRng`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng.try_fill_bytes(dest).map_err(|err| {
            error!("operating system entropy source failed: {err}");
            EntropyError::from(err)
        })
    }
}

/// Returns a random 14-bit clock sequence.
pub(crate) fn random_clock_seq(rng: &(impl RandomSource + ?Sized)) -> Result<u16, EntropyError> {
    let mut buf = [0u8; 2];
    rng.fill(&mut buf)?;
    Ok(u16::from_be_bytes(buf) & 0x3fff)
}

/// Returns a random 48-bit node identifier with the multicast bit set, which marks it as not
/// derived from a hardware address.
pub(crate) fn random_node_id(rng: &(impl RandomSource + ?Sized)) -> Result<[u8; 6], EntropyError> {
    let mut node_id = [0u8; 6];
    rng.fill(&mut node_id)?;
    node_id[0] |= 0x01;
    Ok(node_id)
}
