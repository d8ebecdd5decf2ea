//! Error handling for catalog API operations.

use std::fmt::{self, Display};

use reqwest::StatusCode;
use thiserror::Error;

use crate::reference::IdFromUrlError;

/// The catalog operation that failed, used to build error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListPokemon,
    Pokemon,
    PokemonDetails,
    EvolutionTriggers,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListPokemon => "Pokemon list",
            Operation::Pokemon => "Pokemon",
            Operation::PokemonDetails => "Pokemon details",
            Operation::EvolutionTriggers => "evolution triggers",
        };
        f.write_str(name)
    }
}

/// Common error type for catalog API operations.
///
/// [CatalogClientError::NotFound] is only produced by exact-name lookups,
/// so consumers can branch on the kind instead of inspecting messages.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("Pokemon \"{0}\" not found")]
    NotFound(String),

    #[error("Failed to fetch {operation}: {status}")]
    Status {
        operation: Operation,
        status: StatusCode,
    },

    #[error("Failed to fetch {operation}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {operation} response")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    InvalidReference(#[from] IdFromUrlError),

    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0}")]
    Other(String),
}

impl CatalogClientError {
    /// Whether the error signals that an exact-name lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogClientError::NotFound(_))
    }
}
