// manip_core/src/observers/mod.rs

pub mod eso;

pub use eso::Eso;
