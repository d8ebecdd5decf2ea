//! The state published by the orchestrators in [crate::providers].

use dex_catalog::types::Pokemon;
use serde::Serialize;

/// A fully resolved page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedListing<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> ResolvedListing<T> {
    /// A listing without any results and no further pages
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            has_next: false,
            has_previous: false,
        }
    }
}

/// The state of a listing as observed by a front end
///
/// While `loading` is set, `data` holds the result of the previous cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingState<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> ListingState<T> {
    /// The state before the first cycle settled
    pub fn initial() -> Self {
        Self {
            data: Vec::new(),
            loading: true,
            error: None,
            total_count: 0,
            has_next: false,
            has_previous: false,
        }
    }

    /// Mark the start of a cycle, keeping the previous data
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply the outcome of a cycle.
    ///
    /// On failure the data is cleared,
    /// the total count and page flags keep the values of the last successful cycle.
    pub(crate) fn settle(&mut self, outcome: Result<ResolvedListing<T>, String>) {
        self.loading = false;
        match outcome {
            Ok(listing) => {
                self.data = listing.data;
                self.error = None;
                self.total_count = listing.total_count;
                self.has_next = listing.has_next;
                self.has_previous = listing.has_previous;
            },
            Err(message) => {
                self.data = Vec::new();
                self.error = Some(message);
            },
        }
    }
}

impl<T> Default for ListingState<T> {
    fn default() -> Self {
        Self::initial()
    }
}

/// The state of a single Pokémon lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailsState {
    pub data: Option<Pokemon>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DetailsState {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn settle(&mut self, outcome: Result<Pokemon, String>) {
        self.loading = false;
        match outcome {
            Ok(pokemon) => {
                self.data = Some(pokemon);
                self.error = None;
            },
            Err(message) => {
                self.data = None;
                self.error = Some(message);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn listing(data: Vec<u32>, total_count: u64) -> ResolvedListing<u32> {
        ResolvedListing {
            data,
            total_count,
            has_next: true,
            has_previous: false,
        }
    }

    #[test]
    fn loading_keeps_previous_data() {
        let mut state = ListingState::initial();
        state.settle(Ok(listing(vec![1, 2], 2)));

        state.begin();

        assert!(state.loading);
        assert_eq!(state.data, vec![1, 2]);
    }

    #[test]
    fn failure_clears_data_but_keeps_counts() {
        let mut state = ListingState::initial();
        state.settle(Ok(listing(vec![1, 2], 40)));

        state.begin();
        state.settle(Err("Network error".to_string()));

        assert_eq!(state, ListingState {
            data: vec![],
            loading: false,
            error: Some("Network error".to_string()),
            total_count: 40,
            has_next: true,
            has_previous: false,
        });
    }

    #[test]
    fn success_clears_previous_error() {
        let mut state = ListingState::initial();
        state.settle(Err("Network error".to_string()));
        state.begin();
        assert_eq!(state.error, None);

        state.settle(Ok(listing(vec![3], 1)));
        assert_eq!(state.error, None);
        assert_eq!(state.data, vec![3]);
    }

    #[test]
    fn details_lookup_clears_previous_error() {
        let mut state = DetailsState::default();
        state.settle(Err("Pokemon \"missingno\" not found".to_string()));
        state.begin();
        assert_eq!(state, DetailsState {
            data: None,
            loading: true,
            error: None,
        });
    }
}
