// # Registrar Implementations
//
// This module provides implementations of the Registrar trait that ship with
// the core. Network registrars live in their own crates.

pub mod memory;

pub use memory::{CallCounts, MemoryRegistrar, MemoryRegistrarFactory};
