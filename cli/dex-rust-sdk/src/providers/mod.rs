//! Orchestrators that turn catalog requests into observable state.
//!
//! Every orchestrator publishes its state through a [tokio::sync::watch] channel
//! and only commits the outcome of its most recent fetch cycle.

mod details;
mod fetch_cycle;
mod listing;
mod triggers;

use std::error::Error;

pub use details::{DETAILS_ERROR_FALLBACK, PokemonDetails};
pub use listing::{PokemonListing, SEARCH_RESULT_LIMIT};
pub use triggers::EvolutionTriggerListing;

/// Message reported by listings for errors that don't describe themselves
pub const LISTING_ERROR_FALLBACK: &str = "An unknown error occurred";

/// Render an error and its sources as a single line,
/// or `fallback` if the error has no message at all.
pub(crate) fn error_message(err: &(dyn Error + 'static), fallback: &str) -> String {
    let mut messages = Vec::new();
    let mut current = Some(err);
    while let Some(err) = current {
        let message = err.to_string();
        if !message.is_empty() {
            messages.push(message);
        }
        current = err.source();
    }

    if messages.is_empty() {
        fallback.to_string()
    } else {
        messages.join(": ")
    }
}

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers {
    use dex_catalog::types::{ListingPage, NamedResource, Pokemon, Sprites};

    /// Reference url of a Pokémon as listed by the catalog
    pub fn pokemon_url(id: u32) -> String {
        format!("https://pokeapi.co/api/v2/pokemon/{id}/")
    }

    pub fn reference(id: u32, name: &str) -> NamedResource {
        NamedResource::new(name, pokemon_url(id))
    }

    /// A Pokémon without any tags
    pub fn pokemon(id: u32, name: &str) -> Pokemon {
        Pokemon {
            id,
            name: name.to_string(),
            sprites: Sprites::default(),
            types: vec![],
            height: 4,
            weight: 60,
            stats: vec![],
            abilities: vec![],
            moves: vec![],
        }
    }

    /// A listing page without continuation markers
    pub fn single_page<T>(results: Vec<T>) -> ListingPage<T> {
        ListingPage {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use dex_catalog::CatalogClientError;

    use super::*;

    #[derive(Debug)]
    struct Silent;

    impl fmt::Display for Silent {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    impl Error for Silent {}

    #[derive(Debug)]
    struct Outer(CatalogClientError);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Failed to fetch Pokemon list")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn message_includes_sources() {
        let err = Outer(CatalogClientError::Other("connection refused".to_string()));
        assert_eq!(
            error_message(&err, LISTING_ERROR_FALLBACK),
            "Failed to fetch Pokemon list: connection refused"
        );
    }

    #[test]
    fn empty_message_uses_fallback() {
        assert_eq!(
            error_message(&Silent, LISTING_ERROR_FALLBACK),
            "An unknown error occurred"
        );
    }

    #[test]
    fn plain_message_is_kept() {
        let err = CatalogClientError::Other("Network error".to_string());
        assert_eq!(error_message(&err, LISTING_ERROR_FALLBACK), "Network error");
    }
}
