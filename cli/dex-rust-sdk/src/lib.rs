//! Library code of the Pokémon explorer.
//!
//! The [providers] turn catalog requests into observable state
//! that front ends render.

pub mod dex;
pub mod models;
pub mod providers;
