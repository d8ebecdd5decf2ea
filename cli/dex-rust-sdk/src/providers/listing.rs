use std::sync::{Arc, Mutex};

use dex_catalog::types::{NamedResource, Pokemon};
use dex_catalog::{CatalogClientError, Client, ClientTrait, FALLBACK_SCAN_PAGE_SIZE, all_pokemon};
use futures::future::try_join_all;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::fetch_cycle::FetchCycle;
use super::{LISTING_ERROR_FALLBACK, error_message};
use crate::models::query::{ListingParams, PageParams};
use crate::models::state::{ListingState, ResolvedListing};

/// Maximum number of prefix matches hydrated by a search
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// The Pokémon listing, either a page of the catalog or the results of a search.
///
/// Searches first look up the term as an exact name.
/// If the catalog has no Pokémon of that name,
/// the whole catalog is scanned for names starting with the term.
pub struct PokemonListing<C = Client> {
    client: Arc<C>,
    params: Mutex<ListingParams>,
    cycle: FetchCycle<ListingState<Pokemon>>,
}

impl<C: ClientTrait> PokemonListing<C> {
    /// Create a listing for `params`.
    ///
    /// Nothing is fetched until [Self::refetch] or [Self::set_params] is called.
    pub fn new(client: Arc<C>, params: ListingParams) -> Self {
        Self {
            client,
            params: Mutex::new(params),
            cycle: FetchCycle::new(ListingState::initial()),
        }
    }

    pub fn params(&self) -> ListingParams {
        self.params
            .lock()
            .expect("couldn't acquire params lock")
            .clone()
    }

    pub fn state(&self) -> ListingState<Pokemon> {
        self.cycle.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingState<Pokemon>> {
        self.cycle.subscribe()
    }

    /// Replace the parameters and fetch again if they changed
    pub async fn set_params(&self, params: ListingParams) {
        {
            let mut current = self.params.lock().expect("couldn't acquire params lock");
            if *current == params {
                return;
            }
            *current = params;
        }
        self.refetch().await;
    }

    /// Run a fetch cycle with the current parameters
    #[instrument(skip(self))]
    pub async fn refetch(&self) {
        let params = self.params();
        let generation = self.cycle.begin(ListingState::begin);
        debug!(generation, ?params, "fetching pokemon listing");

        let outcome = self.resolve(&params).await.map_err(|err| {
            warn!(?params, error = %err, "failed to fetch pokemon listing");
            error_message(&err, LISTING_ERROR_FALLBACK)
        });

        if !self.cycle.commit(generation, |state| state.settle(outcome)) {
            debug!(generation, "discarding stale pokemon listing");
        }
    }

    async fn resolve(
        &self,
        params: &ListingParams,
    ) -> Result<ResolvedListing<Pokemon>, CatalogClientError> {
        if !params.is_search() {
            return self.list_page(params.page).await;
        }

        match self.client.pokemon_by_name(&params.search_term).await {
            Ok(pokemon) => Ok(ResolvedListing {
                data: vec![pokemon],
                total_count: 1,
                has_next: false,
                has_previous: false,
            }),
            Err(err) if err.is_not_found() => {
                debug!(term = %params.search_term, "no exact match, scanning catalog");
                self.search_by_prefix(&params.search_term).await
            },
            Err(err) => Err(err),
        }
    }

    async fn list_page(
        &self,
        page: PageParams,
    ) -> Result<ResolvedListing<Pokemon>, CatalogClientError> {
        let listing = self
            .client
            .list_pokemon(page.limit.get(), page.offset)
            .await?;
        let data = self.hydrate(&listing.results).await?;

        Ok(ResolvedListing {
            data,
            total_count: listing.count,
            has_next: listing.has_next(),
            has_previous: listing.has_previous(),
        })
    }

    /// Fetch the details of every reference, failing as a whole on the first error.
    ///
    /// Ids are taken from the reference urls.
    async fn hydrate(
        &self,
        references: &[NamedResource],
    ) -> Result<Vec<Pokemon>, CatalogClientError> {
        try_join_all(references.iter().map(|reference| async move {
            let mut pokemon = self.client.pokemon_details(&reference.url).await?;
            pokemon.id = reference.id()?;
            Ok::<_, CatalogClientError>(pokemon)
        }))
        .await
    }

    async fn search_by_prefix(
        &self,
        term: &str,
    ) -> Result<ResolvedListing<Pokemon>, CatalogClientError> {
        let term = term.to_lowercase();
        let references = all_pokemon(self.client.as_ref(), FALLBACK_SCAN_PAGE_SIZE).await?;

        let matches = references
            .into_iter()
            .filter(|reference| reference.name.to_lowercase().starts_with(&term))
            .collect::<Vec<_>>();
        let total_count = matches.len();
        debug!(total_count, "found prefix matches");

        let shown = &matches[..total_count.min(SEARCH_RESULT_LIMIT)];
        let data = self.hydrate(shown).await?;

        Ok(ResolvedListing {
            data,
            total_count: total_count as u64,
            has_next: total_count > SEARCH_RESULT_LIMIT,
            has_previous: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use dex_catalog::types::{EvolutionTrigger, ListingPage};
    use dex_catalog::{MockClient, MockError, Request};
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::providers::test_helpers::{pokemon, pokemon_url, reference, single_page};

    fn page_params(limit: u32, offset: u32) -> PageParams {
        PageParams::new(NonZeroU32::new(limit).unwrap(), offset)
    }

    fn search(term: &str) -> ListingParams {
        ListingParams::new(PageParams::default(), term)
    }

    fn listing(client: &MockClient, params: ListingParams) -> PokemonListing<MockClient> {
        PokemonListing::new(Arc::new(client.clone()), params)
    }

    /// Serve details for every reference, with a payload id that differs from the url
    fn push_details_for(client: &MockClient, references: &[NamedResource]) {
        for reference in references {
            client.push_details(&reference.url, pokemon(0, &reference.name));
        }
    }

    fn names(state: &ListingState<Pokemon>) -> Vec<&str> {
        state.data.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn page_is_listed_and_hydrated() {
        let client = MockClient::default();
        let references = vec![reference(21, "spearow"), reference(22, "fearow")];
        client.push_pokemon_list(2, 20, ListingPage {
            count: 1302,
            next: Some("https://pokeapi.co/api/v2/pokemon?offset=22&limit=2".to_string()),
            previous: Some("https://pokeapi.co/api/v2/pokemon?offset=18&limit=2".to_string()),
            results: references.clone(),
        });
        push_details_for(&client, &references);

        let listing = listing(&client, ListingParams::new(page_params(2, 20), ""));
        listing.refetch().await;

        let state = listing.state();
        assert_eq!(names(&state), vec!["spearow", "fearow"]);
        assert_eq!(
            state.data.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![21, 22]
        );
        assert_eq!(state.total_count, 1302);
        assert!(state.has_next);
        assert!(state.has_previous);
        assert!(!state.loading);
        assert_eq!(state.error, None);

        let requests = client.requests();
        assert_eq!(requests[0], Request::ListPokemon {
            limit: 2,
            offset: 20
        });
        assert_eq!(requests.len(), 1 + references.len());
    }

    #[tokio::test]
    async fn page_flags_follow_continuation_markers() {
        let client = MockClient::default();
        client.push_pokemon_list(20, 0, ListingPage {
            count: 1,
            next: None,
            previous: None,
            results: vec![reference(1, "bulbasaur")],
        });
        client.push_details(pokemon_url(1), pokemon(1, "bulbasaur"));

        let listing = listing(&client, ListingParams::default());
        listing.refetch().await;

        let state = listing.state();
        assert!(!state.has_next);
        assert!(!state.has_previous);
    }

    #[tokio::test]
    async fn exact_match_trusts_payload_id() {
        let client = MockClient::default();
        client.push_pokemon(pokemon(25, "pikachu"));

        let listing = listing(&client, search("Pikachu"));
        listing.refetch().await;

        assert_eq!(listing.state(), ListingState {
            data: vec![pokemon(25, "pikachu")],
            loading: false,
            error: None,
            total_count: 1,
            has_next: false,
            has_previous: false,
        });
    }

    fn push_catalog(client: &MockClient, references: Vec<NamedResource>) {
        client.push_pokemon_list(
            FALLBACK_SCAN_PAGE_SIZE.get(),
            0,
            single_page(references.clone()),
        );
        push_details_for(client, &references);
    }

    #[tokio::test]
    async fn prefix_search_after_missing_exact_match() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "pika".to_string(),
            },
            MockError::NotFound,
        );
        push_catalog(&client, vec![
            reference(25, "pikachu"),
            reference(26, "raichu"),
            reference(731, "pikipek"),
        ]);

        let listing = listing(&client, search("pika"));
        listing.refetch().await;

        let state = listing.state();
        // "pikipek" does not start with "pika"
        assert_eq!(names(&state), vec!["pikachu"]);
        assert_eq!(state.total_count, 1);
        assert!(!state.has_next);
    }

    #[tokio::test]
    async fn prefix_search_keeps_catalog_order() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "pik".to_string(),
            },
            MockError::NotFound,
        );
        push_catalog(&client, vec![
            reference(25, "pikachu"),
            reference(26, "raichu"),
            reference(731, "pikipek"),
        ]);

        let listing = listing(&client, search("Pik"));
        listing.refetch().await;

        let state = listing.state();
        assert_eq!(names(&state), vec!["pikachu", "pikipek"]);
        assert_eq!(
            state.data.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![25, 731]
        );
        assert_eq!(state.total_count, 2);
        assert!(!state.has_next);
        assert!(!state.has_previous);
    }

    #[tokio::test]
    async fn prefix_search_hydrates_at_most_twenty() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "mon".to_string(),
            },
            MockError::NotFound,
        );
        let references = (1..=25)
            .map(|id| reference(id, &format!("mon-{id}")))
            .collect::<Vec<_>>();
        push_catalog(&client, references);

        let listing = listing(&client, search("mon"));
        listing.refetch().await;

        let state = listing.state();
        assert_eq!(state.data.len(), SEARCH_RESULT_LIMIT);
        assert_eq!(state.data[19].name, "mon-20");
        assert_eq!(state.total_count, 25);
        assert!(state.has_next);

        let detail_requests = client
            .requests()
            .into_iter()
            .filter(|request| matches!(request, Request::PokemonDetails { .. }))
            .count();
        assert_eq!(detail_requests, SEARCH_RESULT_LIMIT);
    }

    #[tokio::test]
    async fn prefix_search_follows_continuation_markers() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "pi".to_string(),
            },
            MockError::NotFound,
        );
        client.push_pokemon_list(1000, 0, ListingPage {
            count: 2,
            next: Some("https://pokeapi.co/api/v2/pokemon?offset=1&limit=1000".to_string()),
            previous: None,
            results: vec![reference(25, "pikachu")],
        });
        client.push_pokemon_list(1000, 1, ListingPage {
            count: 2,
            next: None,
            previous: Some("https://pokeapi.co/api/v2/pokemon?offset=0&limit=1000".to_string()),
            results: vec![reference(1008, "pichu-late")],
        });
        push_details_for(&client, &[
            reference(25, "pikachu"),
            reference(1008, "pichu-late"),
        ]);

        let listing = listing(&client, search("pi"));
        listing.refetch().await;

        assert_eq!(names(&listing.state()), vec!["pikachu", "pichu-late"]);
    }

    #[tokio::test]
    async fn search_without_matches_is_empty() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "zzz".to_string(),
            },
            MockError::NotFound,
        );
        push_catalog(&client, vec![reference(25, "pikachu")]);

        let listing = listing(&client, search("zzz"));
        listing.refetch().await;

        assert_eq!(listing.state(), ListingState {
            data: vec![],
            loading: false,
            error: None,
            total_count: 0,
            has_next: false,
            has_previous: false,
        });
    }

    #[tokio::test]
    async fn search_term_is_not_trimmed() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: " pikachu".to_string(),
            },
            MockError::NotFound,
        );
        push_catalog(&client, vec![reference(25, "pikachu")]);

        let listing = listing(&client, search(" pikachu"));
        listing.refetch().await;

        assert!(listing.state().data.is_empty());
    }

    #[tokio::test]
    async fn other_lookup_errors_skip_the_fallback() {
        let client = MockClient::default();
        client.push_error(
            Request::PokemonByName {
                name: "pikachu".to_string(),
            },
            MockError::Status(500),
        );

        let listing = listing(&client, search("pikachu"));
        listing.refetch().await;

        let state = listing.state();
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to fetch Pokemon: 500 Internal Server Error")
        );
        assert!(
            !client
                .requests()
                .iter()
                .any(|request| matches!(request, Request::ListPokemon { .. }))
        );
    }

    #[tokio::test]
    async fn failure_is_reported_as_message() {
        let client = MockClient::default();
        client.push_error(
            Request::ListPokemon {
                limit: 20,
                offset: 0,
            },
            MockError::Message("Network error".to_string()),
        );

        let listing = listing(&client, ListingParams::default());
        listing.refetch().await;

        let state = listing.state();
        assert_eq!(state.error.as_deref(), Some("Network error"));
        assert!(state.data.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failed_hydration_fails_the_page() {
        let client = MockClient::default();
        client.push_pokemon_list(
            20,
            0,
            single_page(vec![reference(1, "bulbasaur"), reference(2, "ivysaur")]),
        );
        client.push_details(pokemon_url(1), pokemon(1, "bulbasaur"));
        client.push_error(
            Request::PokemonDetails { url: pokemon_url(2) },
            MockError::Status(503),
        );

        let listing = listing(&client, ListingParams::default());
        listing.refetch().await;

        let state = listing.state();
        assert!(state.data.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to fetch Pokemon details: 503 Service Unavailable")
        );
    }

    #[tokio::test]
    async fn failure_keeps_previous_counts() {
        let client = MockClient::default();
        client.push_pokemon_list(20, 0, ListingPage {
            count: 40,
            next: Some("https://pokeapi.co/api/v2/pokemon?offset=20&limit=20".to_string()),
            previous: None,
            results: vec![],
        });
        client.push_error(
            Request::ListPokemon {
                limit: 20,
                offset: 20,
            },
            MockError::Message("Network error".to_string()),
        );

        let listing = listing(&client, ListingParams::default());
        listing.refetch().await;
        listing
            .set_params(ListingParams::new(page_params(20, 20), ""))
            .await;

        let state = listing.state();
        assert_eq!(state.error.as_deref(), Some("Network error"));
        assert_eq!(state.total_count, 40);
        assert!(state.has_next);
    }

    #[tokio::test]
    async fn unchanged_params_do_not_refetch() {
        let client = MockClient::default();
        client.push_pokemon_list(20, 0, single_page(vec![]));

        let listing = listing(&client, ListingParams::default());
        listing.refetch().await;
        listing.set_params(ListingParams::default()).await;

        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn loading_is_published_before_results() {
        let client = MockClient::default();
        client.push_pokemon_list(20, 0, single_page(vec![]));

        let listing = listing(&client, ListingParams::default());
        let mut receiver = listing.subscribe();
        assert!(receiver.borrow_and_update().loading);

        listing.refetch().await;

        assert!(receiver.has_changed().unwrap());
        assert!(!receiver.borrow_and_update().loading);
    }

    /// Holds back the first page of the catalog until released
    struct GatedClient {
        inner: MockClient,
        gate: Notify,
    }

    impl ClientTrait for GatedClient {
        async fn list_pokemon(
            &self,
            limit: u32,
            offset: u32,
        ) -> Result<ListingPage<NamedResource>, CatalogClientError> {
            if offset == 0 {
                self.gate.notified().await;
            }
            self.inner.list_pokemon(limit, offset).await
        }

        async fn pokemon_by_name(&self, name: &str) -> Result<Pokemon, CatalogClientError> {
            self.inner.pokemon_by_name(name).await
        }

        async fn pokemon_details(&self, url: &str) -> Result<Pokemon, CatalogClientError> {
            self.inner.pokemon_details(url).await
        }

        async fn list_evolution_triggers(
            &self,
            limit: u32,
            offset: u32,
        ) -> Result<ListingPage<EvolutionTrigger>, CatalogClientError> {
            self.inner.list_evolution_triggers(limit, offset).await
        }
    }

    #[tokio::test]
    async fn stale_cycle_does_not_overwrite_newer_state() {
        let inner = MockClient::default();
        inner.push_pokemon_list(20, 0, single_page(vec![reference(1, "bulbasaur")]));
        inner.push_pokemon_list(20, 20, single_page(vec![reference(21, "spearow")]));
        push_details_for(&inner, &[reference(1, "bulbasaur"), reference(21, "spearow")]);

        let client = Arc::new(GatedClient {
            inner,
            gate: Notify::new(),
        });
        let listing = PokemonListing::new(client.clone(), ListingParams::default());

        tokio::join!(listing.refetch(), async {
            listing
                .set_params(ListingParams::new(page_params(20, 20), ""))
                .await;
            client.gate.notify_one();
        });

        let state = listing.state();
        assert_eq!(names(&state), vec!["spearow"]);
        assert!(!state.loading);
    }
}
