use std::sync::{Arc, Mutex};

use dex_catalog::{Client, ClientTrait};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::error_message;
use super::fetch_cycle::FetchCycle;
use crate::models::state::DetailsState;

/// Message reported for detail lookups that fail without a message
pub const DETAILS_ERROR_FALLBACK: &str = "Failed to fetch Pokemon details";

/// A single Pokémon looked up by its exact name.
///
/// Without a name the state stays empty and nothing is fetched.
pub struct PokemonDetails<C = Client> {
    client: Arc<C>,
    name: Mutex<Option<String>>,
    cycle: FetchCycle<DetailsState>,
}

impl<C: ClientTrait> PokemonDetails<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            name: Mutex::new(None),
            cycle: FetchCycle::new(DetailsState::default()),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.name
            .lock()
            .expect("couldn't acquire name lock")
            .clone()
    }

    pub fn state(&self) -> DetailsState {
        self.cycle.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailsState> {
        self.cycle.subscribe()
    }

    /// Look up `name`, or clear the state if there is none.
    ///
    /// Does nothing if the name did not change.
    pub async fn set_name(&self, name: Option<String>) {
        {
            let mut current = self.name.lock().expect("couldn't acquire name lock");
            if *current == name {
                return;
            }
            *current = name;
        }
        self.refetch().await;
    }

    /// Look up the current name again
    #[instrument(skip(self))]
    pub async fn refetch(&self) {
        let Some(name) = self.name() else {
            debug!("no pokemon selected");
            self.cycle.reset(DetailsState::default());
            return;
        };

        let generation = self.cycle.begin(DetailsState::begin);
        debug!(generation, %name, "fetching pokemon details");

        let outcome = self.client.pokemon_by_name(&name).await.map_err(|err| {
            warn!(%name, error = %err, "failed to fetch pokemon details");
            error_message(&err, DETAILS_ERROR_FALLBACK)
        });

        if !self.cycle.commit(generation, |state| state.settle(outcome)) {
            debug!(generation, %name, "discarding stale pokemon details");
        }
    }
}
