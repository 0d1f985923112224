//! Data models for lines, line items and configuration.

pub mod config;
pub mod item;
pub mod line;
