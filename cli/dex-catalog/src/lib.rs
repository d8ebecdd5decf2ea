//! HTTP client infrastructure for the PokeAPI catalog.
//!
//! This crate provides:
//! - An HTTP client for the four catalog read operations
//! - Typed errors that distinguish a missing Pokémon from other failures
//! - Wire types for Pokémon, listing pages and evolution triggers
//! - A mock client with canned responses for tests and offline runs
//!
//! ## Usage
//!
//! ```ignore
//! use dex_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let page = client.list_pokemon(20, 0).await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
mod reference;
pub mod types;

pub use client::{
    CatalogClient,
    Client,
    ClientTrait,
    FALLBACK_SCAN_PAGE_SIZE,
    all_pokemon,
};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{CatalogClientError, Operation};
pub use mock::{DEX_CATALOG_MOCK_DATA_VAR, MockClient, MockDataError, MockError, Request, Response};
pub use reference::{IdFromUrlError, id_from_url};
