//! Visibility executor and its port interfaces

pub mod ports;
pub mod service;
