//! PRNG collaborator, mirroring `kernel::hil::rng::RNG` in Tock and
//! `mira_random_generate()` in the original source (`u16`-at-a-time,
//! synchronous from the capsule's point of view).

/// A synchronous source of randomness. The original collaborator
/// (`mira_random_generate`) is synchronous despite most other Mira calls
/// being callback-driven, so no async/`Client` split is needed here.
pub trait Rng {
    fn random_u16(&self) -> u16;
}
