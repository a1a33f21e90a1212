use rusqlite::Connection;
use tracing::{info, warn};

use super::{fetch, Gateway, QueryError};

/// Words that never identify an entity on their own.
const STOP_WORDS: [&str; 12] = [
    "de", "del", "la", "las", "los", "el", "en", "y", "para", "por", "con", "a",
];

/// Tokens this short are too ambiguous to count as a keyword hit.
const MIN_KEYWORD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReferenceEntity {
    pub(crate) id: i64,
    pub(crate) display_name: String,
    pub(crate) keywords: Vec<String>,
}

impl ReferenceEntity {
    pub(crate) fn new(id: i64, display_name: String) -> Self {
        let keywords = keywords(&display_name);
        Self {
            id,
            display_name,
            keywords,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReferenceSituation {
    pub(crate) id: i64,
    pub(crate) display_name: String,
}

/// Lookup lists an interpreter recognises in free text.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReferenceData {
    pub(crate) entities: Vec<ReferenceEntity>,
    pub(crate) situations: Vec<ReferenceSituation>,
}

impl ReferenceData {
    /// Loads both lookups. A failing lookup is logged and left empty so that
    /// the rest of the query still runs.
    pub(crate) fn load<G: Gateway + ?Sized>(gateway: &G) -> Self {
        let entities = match gateway.entities() {
            Ok(rows) => rows
                .into_iter()
                .map(|(id, name)| ReferenceEntity::new(id, name))
                .collect(),
            Err(error) => {
                warn!("Problem while loading entities. {}", error);
                Vec::new()
            }
        };
        let situations = match gateway.situations() {
            Ok(rows) => rows
                .into_iter()
                .map(|(id, display_name)| ReferenceSituation { id, display_name })
                .collect(),
            Err(error) => {
                warn!("Problem while loading situations. {}", error);
                Vec::new()
            }
        };
        info!(
            "Reference data loaded: {} entities, {} situations",
            entities.len(),
            situations.len()
        );
        Self {
            entities,
            situations,
        }
    }
}

/// Lowercased words of `name` that are neither stop words nor shorter than
/// four characters, in order of appearance.
pub(crate) fn keywords(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_string)
        .collect()
}

pub(super) fn select_entities(conn: &Connection) -> Result<Vec<(i64, String)>, QueryError> {
    fetch(
        conn,
        "SELECT id, nombre FROM entidad ORDER BY nombre",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

pub(super) fn select_situations(conn: &Connection) -> Result<Vec<(i64, String)>, QueryError> {
    fetch(
        conn,
        "SELECT id, descripcion FROM situacion ORDER BY id",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}
