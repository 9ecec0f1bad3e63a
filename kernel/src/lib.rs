//! Shared collaborator traits and small fixed-capacity containers used by the
//! mesh protocol capsules.
//!
//! This crate plays the role the Tock `kernel` crate plays for a capsule:
//! it defines the hardware/OS-facing seam (`hil`) that capsule code is
//! written against, plus a couple of allocation-free containers, and a
//! generic low-level status code. It owns no mesh-protocol semantics of its
//! own.

#![cfg_attr(not(test), no_std)]

pub mod common;
pub mod config;
pub mod hil;
pub mod returncode;

pub use returncode::ReturnCode;
