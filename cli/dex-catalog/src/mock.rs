//! A catalog client that answers from canned responses.
//!
//! Used by tests throughout the workspace
//! and by the CLI when `_DEX_USE_CATALOG_MOCK` points at a file of responses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::ClientTrait;
use crate::error::{CatalogClientError, Operation};
use crate::types::{EvolutionTrigger, ListingPage, NamedResource, Pokemon};

pub const DEX_CATALOG_MOCK_DATA_VAR: &str = "_DEX_USE_CATALOG_MOCK";

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// A request as seen by the catalog, used to key canned responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    ListPokemon { limit: u32, offset: u32 },
    PokemonByName { name: String },
    PokemonDetails { url: String },
    ListEvolutionTriggers { limit: u32, offset: u32 },
}

impl Request {
    fn operation(&self) -> Operation {
        match self {
            Request::ListPokemon { .. } => Operation::ListPokemon,
            Request::PokemonByName { .. } => Operation::Pokemon,
            Request::PokemonDetails { .. } => Operation::PokemonDetails,
            Request::ListEvolutionTriggers { .. } => Operation::EvolutionTriggers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    PokemonList(ListingPage<NamedResource>),
    Pokemon(Pokemon),
    EvolutionTriggers(ListingPage<EvolutionTrigger>),
    Error(MockError),
}

/// A failure the mock client should report for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockError {
    /// 404 response
    NotFound,
    /// Any other non-2xx response
    Status(u16),
    /// A failure without a response, e.g. a connection error
    Message(String),
}

impl MockError {
    fn into_client_error(self, request: &Request) -> CatalogClientError {
        let operation = request.operation();
        match (self, request) {
            (MockError::NotFound, Request::PokemonByName { name }) => {
                CatalogClientError::NotFound(name.clone())
            },
            (MockError::NotFound, _) => CatalogClientError::Status {
                operation,
                status: StatusCode::NOT_FOUND,
            },
            (MockError::Status(code), _) => CatalogClientError::Status {
                operation,
                status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            },
            (MockError::Message(message), _) => CatalogClientError::Other(message),
        }
    }
}

/// An entry of a mock data file
#[derive(Debug, Serialize, Deserialize)]
struct MockEntry {
    request: Request,
    response: Response,
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by the _DEX_USE_CATALOG_MOCK var
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// Reads a list of request/response pairs from disk.
fn read_mock_responses(path: impl AsRef<Path>) -> Result<Vec<MockEntry>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    serde_json::from_str(&contents).map_err(MockDataError::ParseJson)
}

/// A catalog client that can be seeded with mock responses
///
/// Responses are keyed by request and can be answered any number of times,
/// so concurrent requests do not depend on the order they are issued in.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<HashMap<Request, Response>>,
    /// Every request received, in the order of arrival
    pub requests: MockField<Vec<Request>>,
}

impl MockClient {
    /// Create a new mock client, potentially reading mock responses from disk
    pub fn new(mock_data_path: Option<impl AsRef<Path>>) -> Result<Self, MockDataError> {
        let client = Self::default();
        if let Some(path) = mock_data_path {
            for MockEntry { request, response } in read_mock_responses(path)? {
                client.push_response(request, response);
            }
        }
        Ok(client)
    }

    /// Answer `request` with `response` from now on
    pub fn push_response(&self, request: Request, response: Response) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .insert(normalize(request), response);
    }

    pub fn push_pokemon_list(&self, limit: u32, offset: u32, page: ListingPage<NamedResource>) {
        self.push_response(
            Request::ListPokemon { limit, offset },
            Response::PokemonList(page),
        );
    }

    /// Serve `pokemon` for exact-name lookups of its name
    pub fn push_pokemon(&self, pokemon: Pokemon) {
        self.push_response(
            Request::PokemonByName {
                name: pokemon.name.clone(),
            },
            Response::Pokemon(pokemon),
        );
    }

    /// Serve `pokemon` for detail requests of `url`
    pub fn push_details(&self, url: impl Into<String>, pokemon: Pokemon) {
        self.push_response(
            Request::PokemonDetails { url: url.into() },
            Response::Pokemon(pokemon),
        );
    }

    pub fn push_evolution_triggers(
        &self,
        limit: u32,
        offset: u32,
        page: ListingPage<EvolutionTrigger>,
    ) {
        self.push_response(
            Request::ListEvolutionTriggers { limit, offset },
            Response::EvolutionTriggers(page),
        );
    }

    pub fn push_error(&self, request: Request, error: MockError) {
        self.push_response(request, Response::Error(error));
    }

    /// The requests received so far
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    fn respond(&self, request: Request) -> Result<Response, CatalogClientError> {
        let key = normalize(request.clone());
        debug!(?key, "answering mock request");
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(key.clone());

        let response = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .get(&key)
            .cloned();

        match response {
            // errors name the request as it was made
            Some(Response::Error(err)) => Err(err.into_client_error(&request)),
            Some(response) => Ok(response),
            None => Err(CatalogClientError::Other(format!(
                "no mock response for {key:?}"
            ))),
        }
    }
}

/// Names are matched case-insensitively like the catalog does
fn normalize(request: Request) -> Request {
    match request {
        Request::PokemonByName { name } => Request::PokemonByName {
            name: name.to_lowercase(),
        },
        other => other,
    }
}

fn unexpected_response(request: &str, response: Response) -> CatalogClientError {
    CatalogClientError::Other(format!(
        "expected {request} response, found {response:?}"
    ))
}

impl ClientTrait for MockClient {
    async fn list_pokemon(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<NamedResource>, CatalogClientError> {
        match self.respond(Request::ListPokemon { limit, offset })? {
            Response::PokemonList(page) => Ok(page),
            other => Err(unexpected_response("pokemon list", other)),
        }
    }

    async fn pokemon_by_name(&self, name: &str) -> Result<Pokemon, CatalogClientError> {
        match self.respond(Request::PokemonByName {
            name: name.to_string(),
        })? {
            Response::Pokemon(pokemon) => Ok(pokemon),
            other => Err(unexpected_response("pokemon", other)),
        }
    }

    async fn pokemon_details(&self, url: &str) -> Result<Pokemon, CatalogClientError> {
        match self.respond(Request::PokemonDetails {
            url: url.to_string(),
        })? {
            Response::Pokemon(pokemon) => Ok(pokemon),
            other => Err(unexpected_response("pokemon details", other)),
        }
    }

    async fn list_evolution_triggers(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ListingPage<EvolutionTrigger>, CatalogClientError> {
        match self.respond(Request::ListEvolutionTriggers { limit, offset })? {
            Response::EvolutionTriggers(page) => Ok(page),
            other => Err(unexpected_response("evolution triggers", other)),
        }
    }
}
