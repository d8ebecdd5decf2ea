use std::path::PathBuf;

use anyhow::{Context, bail};
use dex_catalog::{
    CatalogClient, CatalogClientConfig, Client, DEX_CATALOG_MOCK_DATA_VAR, MockClient,
};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if `_DEX_USE_CATALOG_MOCK` points at a file of mock responses
/// - Initialize a real client for the configured catalog otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    if let Ok(path_str) = std::env::var(DEX_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        return Ok(MockClient::new(Some(path))?.into());
    }

    let client_config = CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        extra_headers: Default::default(),
        user_agent: config.user_agent.clone(),
    };

    debug!(catalog_url = %client_config.catalog_url, "using catalog client");
    let client = CatalogClient::new(client_config).context("Could not create catalog client")?;
    Ok(client.into())
}
