//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync::{Arc, OnceLock};

use crate::clock_seq::ClockSequence;
use crate::error::{EntropyError, Error};
use crate::generator::Generator;
use crate::Uuid;

/// Returns the process-wide global generator, creating one if none exists.
///
/// On Unix, the shared clock sequence is reset when the process ID changes (i.e., upon process
/// forks) so that parent and child do not continue the same sequence.
fn global_gen() -> &'static Generator {
    static G: OnceLock<Generator> = OnceLock::new();
    let g = G.get_or_init(Generator::new);
    if unix_fork_safety::pid_changed() {
        g.clock_sequence().reset();
    }
    g
}

/// Generates a UUIDv1 object with the global generator.
///
/// The node ID is drawn at random once per process with the multicast bit set.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidkit::uuid1()?;
/// println!("{uuid}"); // e.g., "c232ab00-9414-11ec-b3c8-9e6bdeced846"
/// assert_eq!(uuid.version(), Some(1));
/// # Ok::<(), uuidkit::Error>(())
/// ```
pub fn uuid1() -> Result<Uuid, Error> {
    global_gen().new_v1()
}

/// Generates a UUIDv6 object with the global generator.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidkit::uuid6()?;
/// println!("{uuid}"); // e.g., "1ec9414c-232a-6b00-b3c8-9e6bdeced846"
/// # Ok::<(), uuidkit::Error>(())
/// ```
pub fn uuid6() -> Result<Uuid, Error> {
    global_gen().new_v6()
}

/// Generates a UUIDv7 object with the global generator.
///
/// UUIDs from this function strictly increase within the process.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidkit::uuid7()?;
/// println!("{uuid}"); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
///
/// let uuid_string: String = uuidkit::uuid7()?.to_string();
/// # Ok::<(), uuidkit::Error>(())
/// ```
pub fn uuid7() -> Result<Uuid, Error> {
    global_gen().new_v7()
}

/// Generates a UUIDv4 object.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidkit::uuid4()?;
/// println!("{uuid}"); // e.g., "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// # Ok::<(), uuidkit::Error>(())
/// ```
pub fn uuid4() -> Result<Uuid, Error> {
    global_gen().new_v4()
}

/// Returns the clock sequence state of the global generator, for composing custom
/// [`Generator`]s that must not collide with it.
pub fn shared_clock_sequence() -> Arc<ClockSequence> {
    Arc::clone(global_gen().clock_sequence())
}

/// Returns the current clock sequence of the global generator, seeding it if necessary.
pub fn clock_sequence() -> Result<u16, EntropyError> {
    global_gen().current_clock_sequence()
}

/// Overwrites the clock sequence of the global generator (masked to 14 bits).
pub fn set_clock_sequence(seq: u16) {
    global_gen().clock_sequence().set(seq);
}

#[cfg(unix)]
mod unix_fork_safety {
    use log::warn;
    use std::{process, sync::atomic};

    static PID: atomic::AtomicU32 = atomic::AtomicU32::new(0);

    /// Returns true if the process ID differs from the one recorded at the previous call, except
    /// for the very first call.
    pub fn pid_changed() -> bool {
        let pid = process::id();
        match PID.swap(pid, atomic::Ordering::Relaxed) {
            0 => false,
            last_pid if last_pid == pid => false,
            last_pid => {
                warn!("process ID changed from {last_pid} to {pid}; resetting clock sequence");
                true
            }
        }
    }
}

#[cfg(not(unix))]
mod unix_fork_safety {
    pub const fn pid_changed() -> bool {
        false
    }
}
