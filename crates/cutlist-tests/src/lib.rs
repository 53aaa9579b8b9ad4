//! Integration test crate for Cutlist.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every cutlist library crate to verify they work together.

#[cfg(test)]
mod editing;

#[cfg(test)]
mod media;
