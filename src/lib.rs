//! Core library functions for the artist cluster engine

pub mod config;
pub mod data;
pub mod similarity;
pub mod graph;
pub mod cluster;
pub mod storage;
pub mod viz;

pub use anyhow::{Result, anyhow};
