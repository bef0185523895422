//! File format handlers

pub mod gmd;

pub use gmd::{GmdFile, decode, encode, sniff};
