//! File-backed persistence for the profile registry

mod store;

pub use store::RegistryStore;
