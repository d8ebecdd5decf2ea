use std::num::NonZeroU32;

use anyhow::{Result, anyhow};
use bpaf::Bpaf;
use dex_catalog::types::EvolutionTrigger;
use dex_rust_sdk::dex::Dex;
use dex_rust_sdk::models::query::PageCursor;
use dex_rust_sdk::models::state::ListingState;
use tracing::instrument;

use crate::utils::message;
use crate::utils::render::TriggerTable;
use crate::utils::spinner::spin_while_loading;

// List evolution triggers
#[derive(Debug, Bpaf, Clone)]
pub struct Triggers {
    /// Page to show, starting at 1
    #[bpaf(long, argument("page"), fallback(NonZeroU32::MIN))]
    page: NonZeroU32,

    /// Number of triggers per page (default: 10)
    #[bpaf(long, argument("limit"), optional)]
    limit: Option<NonZeroU32>,

    /// Display the triggers as a JSON array
    #[bpaf(long)]
    json: bool,
}

impl Triggers {
    #[instrument(name = "triggers", fields(page = %self.page), skip_all)]
    pub async fn handle(self, dex: Dex) -> Result<()> {
        let cursor = PageCursor::new(self.page, self.limit.unwrap_or(dex.trigger_page_size));

        let listing = dex.evolution_trigger_listing(cursor.params());
        spin_while_loading(
            "Loading evolution triggers",
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
            message::plain("No evolution triggers on this page.");
            return Ok(());
        }

        println!("{}", TriggerTable(&state.data));
        message::plain(format!(
            "Showing {} of {} evolution triggers",
            cursor.item_range(state.total_count),
            state.total_count
        ));
        for hint in navigation_hints(&state, cursor) {
            message::info(hint);
        }
        Ok(())
    }
}

fn navigation_hints(state: &ListingState<EvolutionTrigger>, cursor: PageCursor) -> Vec<String> {
    let limit = cursor.limit();
    let mut hints = Vec::new();
    if state.has_previous {
        let page = cursor.previous_page().page();
        hints.push(format!("Previous page: 'dex triggers --page {page} --limit {limit}'"));
    }
    if state.has_next {
        let page = cursor.next_page().page();
        hints.push(format!("Next page: 'dex triggers --page {page} --limit {limit}'"));
    }
    hints
}
