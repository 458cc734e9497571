//! Quiet period resolution and offset arithmetic

pub mod offsets;
pub mod ports;
pub mod table;
