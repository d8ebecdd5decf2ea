use anyhow::{Result, anyhow, bail};
use bpaf::Bpaf;
use dex_rust_sdk::dex::Dex;
use tracing::instrument;

use crate::utils::message;
use crate::utils::render::PokemonCard;
use crate::utils::spinner::spin_while_loading;

// Show the details of a single Pokémon
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Display the details as JSON
    #[bpaf(long)]
    json: bool,

    /// Exact name of the Pokémon
    #[bpaf(positional("name"))]
    name: String,
}

impl Show {
    #[instrument(name = "show", fields(name = %self.name), skip_all)]
    pub async fn handle(self, dex: Dex) -> Result<()> {
        let name = self.name.trim().to_lowercase();
        if name.is_empty() {
            bail!("Enter the name of a Pokémon to show");
        }

        let details = dex.pokemon_details();
        spin_while_loading(
            &format!("Looking up {name}"),
            details.subscribe(),
            |state| state.loading,
            details.set_name(Some(name)),
        )
        .await;

        let state = details.state();
        if let Some(error) = state.error {
            return Err(anyhow!(error));
        }
        let Some(pokemon) = state.data else {
            bail!("No details were returned");
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&pokemon)?);
            return Ok(());
        }

        let card = PokemonCard {
            pokemon: &pokemon,
            pretty: message::stdout_supports_color(),
        };
        println!("{card}");
        Ok(())
    }
}
