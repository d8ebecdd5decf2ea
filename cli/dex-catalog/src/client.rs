//! Catalog client for the PokeAPI and the trait shared with the mock client.

use std::fmt::Debug;
use std::future::{Future, ready};
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use async_stream::try_stream;
use enum_dispatch::enum_dispatch;
use futures::TryStreamExt;
use futures::stream::Stream;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, Operation};
use crate::mock::MockClient;
use crate::types::{EvolutionTrigger, ListingPage, NamedResource, Pokemon};

/// Page size of the first page requested when scanning the whole catalog.
pub const FALLBACK_SCAN_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(1000).unwrap();

const DEFAULT_USER_AGENT: &str = concat!("dex-cli/", env!("CARGO_PKG_VERSION"));

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the PokeAPI via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List one page of Pokémon references.
    async fn list_pokemon(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<NamedResource>, CatalogClientError>;

    /// Fetch a Pokémon by its exact (case-insensitive) name.
    ///
    /// Fails with [CatalogClientError::NotFound] if the catalog has no such Pokémon.
    async fn pokemon_by_name(&self, name: &str) -> Result<Pokemon, CatalogClientError>;

    /// Fetch a Pokémon from a reference url obtained from a listing.
    async fn pokemon_details(&self, url: &str) -> Result<Pokemon, CatalogClientError>;

    /// List one page of evolution triggers.
    async fn list_evolution_triggers(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<EvolutionTrigger>, CatalogClientError>;
}

/// A client for the catalog service.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url =
            Url::parse(&config.catalog_url).map_err(|source| CatalogClientError::InvalidUrl {
                url: config.catalog_url.clone(),
                source,
            })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::Other(format!(
                "catalog url '{}' cannot be used as a base url",
                config.catalog_url
            )));
        }

        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Update the client configuration and recreate the client.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut CatalogClientConfig),
    ) -> Result<(), CatalogClientError> {
        let mut modified_config = self.config.clone();
        update(&mut modified_config);
        *self = Self::new(modified_config)?;
        Ok(())
    }

    /// Build the url of an endpoint below the base url
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects base urls that cannot be a base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn paged_endpoint(&self, resource: &str, limit: u32, offset: u32) -> Url {
        let mut url = self.endpoint(&[resource]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        operation: Operation,
    ) -> Result<T, CatalogClientError> {
        debug!(%url, %operation, "sending catalog request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogClientError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, %operation, "catalog request failed");
            return Err(CatalogClientError::Status { operation, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CatalogClientError::Transport { operation, source })?;

        serde_json::from_slice(&body)
            .map_err(|source| CatalogClientError::Decode { operation, source })
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self))]
    async fn list_pokemon(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<NamedResource>, CatalogClientError> {
        let url = self.paged_endpoint("pokemon", limit, offset);
        let page: ListingPage<NamedResource> = self.get_json(url, Operation::ListPokemon).await?;

        debug!(
            count = page.count,
            n_results = page.results.len(),
            "received pokemon listing"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn pokemon_by_name(&self, name: &str) -> Result<Pokemon, CatalogClientError> {
        let url = self.endpoint(&["pokemon", &name.to_lowercase()]);
        self.get_json(url, Operation::Pokemon)
            .await
            .map_err(|e| match e {
                CatalogClientError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                    CatalogClientError::NotFound(name.to_string())
                },
                other => other,
            })
    }

    #[instrument(skip(self))]
    async fn pokemon_details(&self, url: &str) -> Result<Pokemon, CatalogClientError> {
        let url = Url::parse(url).map_err(|source| CatalogClientError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        self.get_json(url, Operation::PokemonDetails).await
    }

    #[instrument(skip(self))]
    async fn list_evolution_triggers(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<EvolutionTrigger>, CatalogClientError> {
        let url = self.paged_endpoint("evolution-trigger", limit, offset);
        self.get_json(url, Operation::EvolutionTriggers).await
    }
}

/// Collect every Pokémon reference in catalog order.
///
/// The first page is requested with `page_size` at offset 0,
/// further pages are requested as long as the catalog returns a continuation marker.
pub async fn all_pokemon(
    client: &impl ClientTrait,
    page_size: NonZeroU32,
) -> Result<Vec<NamedResource>, CatalogClientError> {
    let stream = make_depaging_stream(
        |offset, limit| async move { client.list_pokemon(limit, offset).await },
        page_size,
    );

    let (count, references) = collect_listing(stream).await?;
    debug!(
        ?count,
        n_references = references.len(),
        "collected all pokemon references"
    );
    Ok(references)
}

/// Collects a stream of listing items, returning the total count separately.
async fn collect_listing<T, E>(
    stream: impl Stream<Item = Result<StreamItem<T>, E>>,
) -> Result<(Option<u64>, Vec<T>), E> {
    let mut count = None;
    let results = stream
        .try_filter_map(|item| {
            let new_item = match item {
                StreamItem::TotalCount(total) => {
                    count = Some(total);
                    None
                },
                StreamItem::Result(res) => Some(res),
            };
            ready(Ok(new_item))
        })
        .try_collect::<Vec<_>>()
        .await?;
    Ok((count, results))
}

#[derive(Debug, Clone, PartialEq)]
enum StreamItem<T> {
    TotalCount(u64),
    Result(T),
}

impl<T> From<T> for StreamItem<T> {
    fn from(value: T) -> Self {
        Self::Result(value)
    }
}

/// Create a depaging stream from a page-fetching function.
///
/// Takes a function that returns the [ListingPage] for an `(offset, limit)` pair,
/// and yields `TotalCount` once followed by all `Result` items across pages.
/// Paging stops at the first page without a `next` marker or without items.
fn make_depaging_stream<T, E, Fut>(
    generator: impl Fn(u32, u32) -> Fut,
    page_size: NonZeroU32,
) -> impl Stream<Item = Result<StreamItem<T>, E>>
where
    Fut: Future<Output = Result<ListingPage<T>, E>>,
{
    try_stream! {
        let mut offset: u32 = 0;
        let mut total_count_yielded = false;

        loop {
            let page = generator(offset, page_size.get()).await?;

            let items_on_page = page.results.len();
            let has_next = page.has_next();

            if !total_count_yielded {
                yield StreamItem::TotalCount(page.count);
                total_count_yielded = true;
            }

            for result in page.results {
                yield StreamItem::Result(result)
            }

            if !has_next || items_on_page == 0 {
                break;
            }
            offset = offset.saturating_add(items_on_page as u32);
        }
    }
}

/// Build the HTTP client used for all catalog requests.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
