// manip_core/src/lib.rs

// This file defines the public modules of your library.
pub mod controllers;
pub mod error;
pub mod models;
pub mod observers;
pub mod prelude;
pub mod types;
