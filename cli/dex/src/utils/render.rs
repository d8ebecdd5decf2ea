//! Plain text renderings of catalog data.

use std::fmt::{self, Display};

use dex_catalog::types::{EvolutionTrigger, Pokemon, Stat};
use indoc::writedoc;

/// Width of a full stat bar
const STAT_BAR_WIDTH: u32 = 30;
/// Highest possible base stat
const MAX_BASE_STAT: u32 = 255;
/// Number of moves shown on a card
const MOVES_SHOWN: usize = 5;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// The name of a stat as shown to users
pub fn stat_display_name(name: &str) -> &str {
    match name {
        "hp" => "HP",
        "attack" => "Attack",
        "defense" => "Defense",
        "special-attack" => "Sp. Attack",
        "special-defense" => "Sp. Defense",
        "speed" => "Speed",
        other => other,
    }
}

/// Replace the first hyphen of a catalog name with a space
pub fn humanize(name: &str) -> String {
    name.replacen('-', " ", 1)
}

/// The number of filled cells of a stat bar
fn stat_bar_cells(base_stat: u8) -> usize {
    let filled = (u32::from(base_stat) * STAT_BAR_WIDTH + MAX_BASE_STAT / 2) / MAX_BASE_STAT;
    filled as usize
}

fn type_list<'a>(types: impl Iterator<Item = &'a str>) -> String {
    types.collect::<Vec<_>>().join(", ")
}

/// A table of Pokémon with id, name and types
pub struct PokemonTable<'a>(pub &'a [Pokemon]);

impl Display for PokemonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id_width = self
            .0
            .iter()
            .map(|pokemon| pokemon.display_id().len())
            .max()
            .unwrap_or_default()
            .max("ID".len());
        let name_width = self
            .0
            .iter()
            .map(|pokemon| pokemon.name.chars().count())
            .max()
            .unwrap_or_default()
            .max("Name".len());

        write!(f, "{:id_width$}  {:name_width$}  Types", "ID", "Name")?;
        for pokemon in self.0 {
            write!(
                f,
                "\n{:id_width$}  {:name_width$}  {}",
                pokemon.display_id(),
                pokemon.name,
                type_list(pokemon.type_names())
            )?;
        }
        Ok(())
    }
}

/// A table of evolution triggers with id and name
pub struct TriggerTable<'a>(pub &'a [EvolutionTrigger]);

impl Display for TriggerTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = self
            .0
            .iter()
            .map(|trigger| match trigger.resolved_id() {
                Ok(id) => id.to_string(),
                Err(_) => "-".to_string(),
            })
            .collect::<Vec<_>>();
        let id_width = ids.iter().map(String::len).max().unwrap_or_default().max(2);

        write!(f, "{:id_width$}  Name", "ID")?;
        for (id, trigger) in ids.iter().zip(self.0) {
            write!(f, "\n{id:>id_width$}  {}", humanize(&trigger.name))?;
        }
        Ok(())
    }
}

/// The detail card of a single Pokémon
pub struct PokemonCard<'a> {
    pub pokemon: &'a Pokemon,
    /// Whether to color the stat bars
    pub pretty: bool,
}

impl PokemonCard<'_> {
    fn fmt_stat(&self, f: &mut fmt::Formatter<'_>, stat: &Stat) -> fmt::Result {
        let filled = stat_bar_cells(stat.base_stat);
        let bar = "█".repeat(filled);
        let rest = "░".repeat(STAT_BAR_WIDTH as usize - filled);
        let name = stat_display_name(&stat.stat.name);
        if self.pretty {
            writeln!(f, "  {name:<11} {:>3} {GREEN}{bar}{RESET}{rest}", stat.base_stat)
        } else {
            writeln!(f, "  {name:<11} {:>3} {bar}{rest}", stat.base_stat)
        }
    }
}

impl Display for PokemonCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pokemon = self.pokemon;
        writedoc!(
            f,
            "
            {name} {id}
            Types:  {types}
            Height: {height} m
            Weight: {weight} kg
            ",
            name = pokemon.name,
            id = pokemon.display_id(),
            types = type_list(pokemon.type_names()),
            height = pokemon.height_m(),
            weight = pokemon.weight_kg(),
        )?;

        if !pokemon.stats.is_empty() {
            writeln!(f, "\nBase stats:")?;
            for stat in &pokemon.stats {
                self.fmt_stat(f, stat)?;
            }
        }

        let abilities = pokemon.ability_names().map(humanize).collect::<Vec<_>>();
        if !abilities.is_empty() {
            writeln!(f, "\nAbilities: {}", abilities.join(", "))?;
        }

        let moves = pokemon
            .move_names()
            .take(MOVES_SHOWN)
            .map(humanize)
            .collect::<Vec<_>>();
        if !moves.is_empty() {
            writeln!(f, "Moves:     {}", moves.join(", "))?;
        }

        match pokemon.artwork_url() {
            Some(url) => write!(f, "\nArtwork: {url}"),
            None => write!(f, "\nNo artwork available"),
        }
    }
}
