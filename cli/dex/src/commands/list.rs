use std::num::NonZeroU32;

use anyhow::{Result, anyhow};
use bpaf::Bpaf;
use dex_catalog::types::Pokemon;
use dex_rust_sdk::dex::Dex;
use dex_rust_sdk::models::query::{ItemRange, ListingParams, PageCursor};
use dex_rust_sdk::models::state::ListingState;
use dex_rust_sdk::providers::SEARCH_RESULT_LIMIT;
use tracing::instrument;

use crate::utils::message;
use crate::utils::render::PokemonTable;
use crate::utils::spinner::spin_while_loading;

// List Pokémon page by page or search them by name
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Page to show, starting at 1
    #[bpaf(long, argument("page"), fallback(NonZeroU32::MIN))]
    page: NonZeroU32,

    /// Number of Pokémon per page (default: 20)
    #[bpaf(long, argument("limit"), optional)]
    limit: Option<NonZeroU32>,

    /// Search for a name.
    ///
    /// An exact name shows that Pokémon,
    /// any other term shows the Pokémon whose names start with it.
    #[bpaf(long, short, argument("term"))]
    name: Option<String>,

    /// Display the Pokémon as a JSON array
    #[bpaf(long)]
    json: bool,
}

impl List {
    #[instrument(name = "list", fields(page = %self.page, search_term = ?self.name), skip_all)]
    pub async fn handle(self, dex: Dex) -> Result<()> {
        let cursor = PageCursor::new(self.page, self.limit.unwrap_or(dex.page_size));
        let params = ListingParams::new(cursor.params(), self.name.unwrap_or_default());
        if params.is_search() && self.page > NonZeroU32::MIN {
            message::warning("Searches always show the first matches, '--page' is ignored");
        }

        let listing = dex.pokemon_listing(params.clone());
        spin_while_loading(
            "Loading Pokémon",
            listing.subscribe(),
            |state| state.loading,
            listing.refetch(),
        )
        .await;

        let state = listing.state();
        if let Some(error) = state.error {
            return Err(anyhow!(error));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state.data)?);
            return Ok(());
        }

        if state.data.is_empty() {
            if params.is_search() {
                message::plain(no_matches_message(&params.search_term));
            } else {
                message::plain("No Pokémon on this page.");
            }
            return Ok(());
        }

        println!("{}", PokemonTable(&state.data));
        message::plain(summary(&state, cursor, &params));
        for hint in navigation_hints(&state, cursor, &params) {
            message::info(hint);
        }
        Ok(())
    }
}

fn no_matches_message(term: &str) -> String {
    format!("No Pokémon found with the name \"{term}\". Try a different search term.")
}

/// The range of shown items relative to the whole listing
fn summary(state: &ListingState<Pokemon>, cursor: PageCursor, params: &ListingParams) -> String {
    let range = if params.is_search() {
        ItemRange {
            start: 1,
            end: state.data.len() as u64,
        }
    } else {
        cursor.item_range(state.total_count)
    };
    format!("Showing {range} of {} Pokémon", state.total_count)
}

fn navigation_hints(
    state: &ListingState<Pokemon>,
    cursor: PageCursor,
    params: &ListingParams,
) -> Vec<String> {
    if params.is_search() {
        if state.has_next {
            return vec![format!(
                "Only the first {SEARCH_RESULT_LIMIT} matches are shown. Use a longer search term to narrow them down."
            )];
        }
        return vec![];
    }

    let limit = cursor.limit();
    let mut hints = Vec::new();
    if state.has_previous {
        let page = cursor.previous_page().page();
        hints.push(format!("Previous page: 'dex list --page {page} --limit {limit}'"));
    }
    if state.has_next {
        let page = cursor.next_page().page();
        hints.push(format!("Next page: 'dex list --page {page} --limit {limit}'"));
    }
    hints
}
