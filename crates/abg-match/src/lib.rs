//! Shared-profile matching.
//!
//! A specimen's profile is the triple of fingerprints of its resistant,
//! susceptible and high-dose antibiotic sets ([`derive_profile`]). The
//! [`MatchIndex`] keeps every specimen in exactly one profile entry and
//! answers "which other specimens share this exact profile", with a bounded
//! [`MatchCache`] in front of the store.

#![deny(unsafe_code)]

mod cache;
mod hasher;
mod index;
mod locks;

pub use cache::{DEFAULT_CACHE_CAPACITY, MatchCache};
pub use hasher::{derive_profile, fingerprint};
pub use index::{IndexUpdate, MatchIndex};
pub use locks::KeyedLocks;
