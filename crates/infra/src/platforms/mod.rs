//! Platform API adapters.

pub mod youtube;
