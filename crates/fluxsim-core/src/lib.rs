//! Cosmic-ray flux sky maps and the staged detector simulation that consumes
//! them.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
