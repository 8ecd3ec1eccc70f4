// src/config/mod.rs
pub mod resolver;

pub use resolver::ResolverConfig;
