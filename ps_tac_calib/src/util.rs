//! Miscellaneous utility functions
pub mod lib;
