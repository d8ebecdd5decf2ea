use std::sync::{Arc, Mutex};

use dex_catalog::types::EvolutionTrigger;
use dex_catalog::{CatalogClientError, Client, ClientTrait};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::fetch_cycle::FetchCycle;
use super::{LISTING_ERROR_FALLBACK, error_message};
use crate::models::query::PageParams;
use crate::models::state::{ListingState, ResolvedListing};

/// A page of the evolution trigger listing
pub struct EvolutionTriggerListing<C = Client> {
    client: Arc<C>,
    page: Mutex<PageParams>,
    cycle: FetchCycle<ListingState<EvolutionTrigger>>,
}

impl<C: ClientTrait> EvolutionTriggerListing<C> {
    pub fn new(client: Arc<C>, page: PageParams) -> Self {
        Self {
            client,
            page: Mutex::new(page),
            cycle: FetchCycle::new(ListingState::initial()),
        }
    }

    pub fn params(&self) -> PageParams {
        *self.page.lock().expect("couldn't acquire params lock")
    }

    pub fn state(&self) -> ListingState<EvolutionTrigger> {
        self.cycle.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingState<EvolutionTrigger>> {
        self.cycle.subscribe()
    }

    pub async fn set_params(&self, page: PageParams) {
        {
            let mut current = self.page.lock().expect("couldn't acquire params lock");
            if *current == page {
                return;
            }
            *current = page;
        }
        self.refetch().await;
    }

    #[instrument(skip(self))]
    pub async fn refetch(&self) {
        let page = self.params();
        let generation = self.cycle.begin(ListingState::begin);
        debug!(generation, ?page, "fetching evolution triggers");

        let outcome = self.resolve(page).await.map_err(|err| {
            warn!(?page, error = %err, "failed to fetch evolution triggers");
            error_message(&err, LISTING_ERROR_FALLBACK)
        });

        if !self.cycle.commit(generation, |state| state.settle(outcome)) {
            debug!(generation, "discarding stale evolution triggers");
        }
    }

    async fn resolve(
        &self,
        page: PageParams,
    ) -> Result<ResolvedListing<EvolutionTrigger>, CatalogClientError> {
        let listing = self
            .client
            .list_evolution_triggers(page.limit.get(), page.offset)
            .await?;
        Ok(ResolvedListing {
            total_count: listing.count,
            has_next: listing.has_next(),
            has_previous: listing.has_previous(),
            data: listing.results,
        })
    }
}
