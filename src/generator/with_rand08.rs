//! Integration with `rand` (v0.8) crate.

use std::sync::{Mutex, PoisonError};

use log::error;
use rand::RngCore;

use super::Generator;
use crate::error::EntropyError;
use crate::rand_source::RandomSource;
use crate::time::{SystemClock, TimeSource};

/// An adapter that implements [`RandomSource`] for [`RngCore`] types.
///
/// The wrapped generator sits behind a mutex so that RNGs that are not `Sync` can be shared by
/// concurrent callers. Bytes are drawn with [`RngCore::try_fill_bytes`], so failures of fallible
/// generators are reported rather than hidden.
#[derive(Debug, Default)]
pub struct Adapter<T>(Mutex<T>);

impl<T> Adapter<T> {
    /// Wraps `rng`.
    pub const fn new(rng: T) -> Self {
        Self(Mutex::new(rng))
    }

    /// Unwraps the inner generator.
    pub fn into_inner(self) -> T {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: RngCore + Send> RandomSource for Adapter<T> {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        rng.try_fill_bytes(dest).map_err(|err| {
            error!("random number generator failed: {err}");
            EntropyError::from(err)
        })
    }
}

impl<T: RngCore + Send> Generator<Adapter<T>, SystemClock> {
    /// Creates a generator with a specified random number generator that implements
    /// [`RngCore`] from `rand` (v0.8) crate.
    ///
    /// Only cryptographically strong generators should be used outside tests.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rand::rngs::OsRng;
    /// use uuidkit::Generator;
    ///
    /// let g = Generator::with_rand08(OsRng);
    /// println!("{}", g.new_v6()?);
    /// # Ok::<(), uuidkit::Error>(())
    /// ```
    pub fn with_rand08(rng: T) -> Self {
        Self::with_sources(Adapter::new(rng), SystemClock)
    }
}

impl<T: RngCore + Send, C: TimeSource> Generator<Adapter<T>, C> {
    /// Creates a generator with a `rand` (v0.8) random number generator and a custom
    /// [`TimeSource`].
    pub fn with_rand08_and_clock(rng: T, clock: C) -> Self {
        Self::with_sources(Adapter::new(rng), clock)
    }
}

#[cfg(test)]
mod tests {
    use super::Adapter;
    use crate::rand_source::RandomSource;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    /// A mock RNG that copies prepared data or fails like a broken entropy device
    struct MockRng {
        data: Vec<u8>,
        fail: bool,
    }

    impl RngCore for MockRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).unwrap()
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            if self.fail {
                return Err(rand::Error::new(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "read error",
                )));
            }
            for (d, s) in dest.iter_mut().zip(self.data.iter().cycle()) {
                *d = *s;
            }
            Ok(())
        }
    }

    /// Fills slice with data from wrapped RNG
    #[test]
    fn fills_slice_with_data_from_wrapped_rng() {
        let rng = Adapter::new(MockRng {
            data: vec![0x01, 0x02, 0x03, 0x04],
            fail: false,
        });
        let mut b = [0u8; 4];
        rng.fill(&mut b).unwrap();
        assert_eq!(b, [0x01, 0x02, 0x03, 0x04]);
    }

    /// Surfaces error of wrapped RNG
    #[test]
    fn surfaces_error_of_wrapped_rng() {
        let rng = Adapter::new(MockRng {
            data: vec![],
            fail: true,
        });
        let err = rng.fill(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.message(), "read error");
    }

    /// Reproduces byte stream of seeded RNG
    #[test]
    fn reproduces_byte_stream_of_seeded_rng() {
        let a = Adapter::new(ChaCha20Rng::seed_from_u64(42));
        let b = Adapter::new(ChaCha20Rng::seed_from_u64(42));
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.fill(&mut x).unwrap();
        b.fill(&mut y).unwrap();
        assert_eq!(x, y);

        let mut expected = [0u8; 32];
        ChaCha20Rng::seed_from_u64(42).fill_bytes(&mut expected);
        assert_eq!(x, expected);
        assert_eq!(
            a.into_inner().get_seed(),
            ChaCha20Rng::seed_from_u64(42).get_seed()
        );
    }
}
