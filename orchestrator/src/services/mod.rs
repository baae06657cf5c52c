//! Service implementations
//!
//! Real implementations of the service traits. These handle the actual I/O.

pub mod file_system;

pub use file_system::RealFileSystem;

#[cfg(test)]
mod tests;
