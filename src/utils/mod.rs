//! Path and identifier helpers.

pub mod validation;
