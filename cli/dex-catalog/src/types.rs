//! Wire types of the catalog API.
//!
//! Only the fields the explorer consumes are modelled,
//! unknown fields in catalog payloads are ignored.

use serde::{Deserialize, Serialize};

use crate::reference::{IdFromUrlError, id_from_url};

/// One page of a paginated catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage<T> {
    /// Total number of items in the catalog
    pub count: u64,
    /// Continuation marker for the following page
    pub next: Option<String>,
    /// Continuation marker for the preceding page
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> ListingPage<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// A lightweight reference to a catalog resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The id encoded in the reference url.
    pub fn id(&self) -> Result<u32, IdFromUrlError> {
        id_from_url(&self.url)
    }
}

/// An evolution trigger as returned by the evolution trigger listing.
///
/// The listing only carries `name` and `url`,
/// the id is present when a trigger was fetched individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    pub url: String,
}

impl EvolutionTrigger {
    /// The trigger's id, derived from its url if the payload carries none.
    pub fn resolved_id(&self) -> Result<u32, IdFromUrlError> {
        match self.id {
            Some(id) => Ok(id),
            None => id_from_url(&self.url),
        }
    }
}

/// A tag that only carries a name, e.g. a type or an ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Artwork,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub type_: Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub base_stat: u8,
    pub stat: Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub move_: Named,
}

/// A single Pokémon with its attributes, tags and measurements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
}

impl Pokemon {
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|slot| slot.type_.name.as_str())
    }

    pub fn ability_names(&self) -> impl Iterator<Item = &str> {
        self.abilities.iter().map(|slot| slot.ability.name.as_str())
    }

    pub fn move_names(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(|slot| slot.move_.name.as_str())
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    /// The official artwork if available, the default front sprite otherwise.
    pub fn artwork_url(&self) -> Option<&str> {
        self.sprites
            .other
            .official_artwork
            .front_default
            .as_deref()
            .or(self.sprites.front_default.as_deref())
    }

    /// The id as shown to users, e.g. `#025`
    pub fn display_id(&self) -> String {
        format!("#{:03}", self.id)
    }
}
