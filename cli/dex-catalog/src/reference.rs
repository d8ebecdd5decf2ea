//! Identifiers derived from catalog reference URLs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdFromUrlError {
    #[error("reference url '{0}' has no id segment")]
    MissingSegment(String),
    #[error("reference url '{url}' has a non-numeric id segment '{segment}'")]
    NotANumber { url: String, segment: String },
}

/// Extract the numeric id from a reference url of the form `.../<resource>/<id>/`.
///
/// The id is read from the second-to-last `/`-separated segment,
/// so the trailing slash the catalog puts on every reference is required:
/// `https://pokeapi.co/api/v2/pokemon/25` yields [IdFromUrlError::NotANumber].
pub fn id_from_url(url: &str) -> Result<u32, IdFromUrlError> {
    let segments = url.split('/').collect::<Vec<_>>();
    let Some(segment) = segments.len().checked_sub(2).map(|i| segments[i]) else {
        return Err(IdFromUrlError::MissingSegment(url.to_string()));
    };

    segment
        .parse::<u32>()
        .map_err(|_| IdFromUrlError::NotANumber {
            url: url.to_string(),
            segment: segment.to_string(),
        })
}
