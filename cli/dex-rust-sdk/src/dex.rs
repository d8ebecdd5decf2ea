use std::num::NonZeroU32;
use std::sync::Arc;

use dex_catalog::Client;

use crate::models::query::{
    DEFAULT_PAGE_SIZE,
    DEFAULT_TRIGGER_PAGE_SIZE,
    ListingParams,
    PageParams,
};
use crate::providers::{EvolutionTriggerListing, PokemonDetails, PokemonListing};

/// The main API struct of the explorer
///
/// A [Dex] instance carries the catalog client and the page sizes
/// and hands out orchestrators that share the client.
#[derive(Debug)]
pub struct Dex {
    pub catalog_client: Arc<Client>,
    /// Page size of the Pokémon listing
    pub page_size: NonZeroU32,
    /// Page size of the evolution trigger listing
    pub trigger_page_size: NonZeroU32,
}

impl Dex {
    pub fn new(catalog_client: Client) -> Self {
        Self {
            catalog_client: Arc::new(catalog_client),
            page_size: DEFAULT_PAGE_SIZE,
            trigger_page_size: DEFAULT_TRIGGER_PAGE_SIZE,
        }
    }

    pub fn pokemon_listing(&self, params: ListingParams) -> PokemonListing {
        PokemonListing::new(self.catalog_client.clone(), params)
    }

    pub fn evolution_trigger_listing(&self, page: PageParams) -> EvolutionTriggerListing {
        EvolutionTriggerListing::new(self.catalog_client.clone(), page)
    }

    pub fn pokemon_details(&self) -> PokemonDetails {
        PokemonDetails::new(self.catalog_client.clone())
    }
}

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers {
    use dex_catalog::MockClient;

    use super::*;

    /// A [Dex] backed by a mock client, returned alongside for seeding responses
    pub fn dex_instance() -> (Dex, MockClient) {
        let mock = MockClient::default();
        let dex = Dex::new(Client::Mock(mock.clone()));
        (dex, mock)
    }
}
