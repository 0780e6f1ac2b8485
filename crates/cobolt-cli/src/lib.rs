#![allow(unused_crate_dependencies)] // false positives because there is both a library and a binary

//! Library side of the `cobolt` binary: configuration resolution, output
//! writers, and the conversion run loop.

pub mod config;
pub mod run;
pub mod writers;
