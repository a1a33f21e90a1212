//! Extraction of filters from Spanish free text.
//!
//! Each rule runs once over the trimmed, lowercased text, in a fixed order.
//! A rule that does not match leaves its fields unset; nothing here fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::database::{ReferenceData, ReferenceEntity, ReferenceSituation};

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:año|anio|del)\s+([0-9]{4})|\b([0-9]{4})\b").expect("valid year pattern")
});

static YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:entre|desde)\s+([0-9]{4})\s+(?:y|hasta)\s+([0-9]{4})")
        .expect("valid year range pattern")
});

static MIN_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"valor\s+(?:mayor|superior)\s+(?:a|que)\s+([0-9]+(?:[.,][0-9]+)?)\s*(?:mil|millon|millones)?",
    )
    .expect("valid minimum value pattern")
});

static MAX_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"valor\s+(?:menor|inferior)\s+(?:a|que)\s+([0-9]+(?:[.,][0-9]+)?)\s*(?:mil|millon|millones)?",
    )
    .expect("valid maximum value pattern")
});

static ORGANIZATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:ministerio|instituto|agencia|secretaría|gobernación|alcaldía)\s+de\s+")
        .expect("valid organization prefix pattern")
});

/// A prefix-stripped entity name must be longer than this to be matched.
const MIN_STRIPPED_NAME_LEN: usize = 5;

/// Keyword hits an entity needs before a fuzzy match is accepted.
const MIN_KEYWORD_HITS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Mode {
    Basic,
    Advanced,
}

/// Filters recognised in one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParsedQuery {
    pub(crate) year: Option<i32>,
    pub(crate) year_range_start: Option<i32>,
    pub(crate) year_range_end: Option<i32>,
    pub(crate) entity_id: Option<i64>,
    pub(crate) entity_name: Option<String>,
    pub(crate) situation_id: Option<i64>,
    pub(crate) situation_name: Option<String>,
    pub(crate) min_value: Option<f64>,
    pub(crate) max_value: Option<f64>,
    pub(crate) raw_text: String,
}

impl ParsedQuery {
    /// `Advanced` as soon as a year range or a value bound was recognised.
    pub(crate) fn mode(&self) -> Mode {
        if self.year_range().is_some() || self.min_value.is_some() || self.max_value.is_some() {
            Mode::Advanced
        } else {
            Mode::Basic
        }
    }

    pub(crate) fn year_range(&self) -> Option<(i32, i32)> {
        self.year_range_start.zip(self.year_range_end)
    }
}

pub(crate) fn parse(text: &str, reference: &ReferenceData) -> ParsedQuery {
    let lowered = text.trim().to_lowercase();
    let mut parsed = ParsedQuery {
        raw_text: text.to_string(),
        ..ParsedQuery::default()
    };
    if lowered.is_empty() {
        return parsed;
    }

    parsed.year = YEAR.captures(&lowered).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
    });

    if let Some(caps) = YEAR_RANGE.captures(&lowered) {
        parsed.year_range_start = caps[1].parse().ok();
        parsed.year_range_end = caps[2].parse().ok();
    }

    if let Some(entity) = match_entity(&lowered, &reference.entities) {
        parsed.entity_id = Some(entity.id);
        parsed.entity_name = Some(entity.display_name.clone());
    }

    if let Some(situation) = match_situation(&lowered, &reference.situations) {
        parsed.situation_id = Some(situation.id);
        parsed.situation_name = Some(situation.display_name.clone());
    }

    parsed.min_value = value_bound(&MIN_VALUE, &lowered);
    parsed.max_value = value_bound(&MAX_VALUE, &lowered);

    parsed
}

/// Finds the entity `text` talks about: full name first, then the name
/// without its organization prefix, then the best keyword overlap.
pub(crate) fn match_entity<'a>(
    text: &str,
    entities: &'a [ReferenceEntity],
) -> Option<&'a ReferenceEntity> {
    if let Some(entity) = entities
        .iter()
        .find(|entity| contains_name(text, &entity.display_name.to_lowercase()))
    {
        return Some(entity);
    }

    if let Some(entity) = entities.iter().find(|entity| {
        let stripped = ORGANIZATION_PREFIX
            .replace(&entity.display_name, "")
            .to_lowercase();
        stripped.chars().count() > MIN_STRIPPED_NAME_LEN && text.contains(&stripped)
    }) {
        return Some(entity);
    }

    let mut best: Option<(&ReferenceEntity, usize)> = None;
    for entity in entities {
        let hits = entity
            .keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .count();
        if hits >= MIN_KEYWORD_HITS && best.map_or(true, |(_, top)| hits > top) {
            best = Some((entity, hits));
        }
    }
    best.map(|(entity, _)| entity)
}

pub(crate) fn match_situation<'a>(
    text: &str,
    situations: &'a [ReferenceSituation],
) -> Option<&'a ReferenceSituation> {
    if let Some(situation) = situations
        .iter()
        .find(|situation| contains_name(text, &situation.display_name.to_lowercase()))
    {
        return Some(situation);
    }

    if text.contains("suscrito") {
        situations
            .iter()
            .find(|situation| situation.display_name.to_lowercase() == "suscrito")
    } else if text.contains("ejecuci") {
        situations
            .iter()
            .find(|situation| situation.display_name.to_lowercase().contains("ejecuci"))
    } else {
        None
    }
}

/// A blank reference name would otherwise match every query.
fn contains_name(text: &str, name: &str) -> bool {
    !name.trim().is_empty() && text.contains(name)
}

fn value_bound(pattern: &Regex, text: &str) -> Option<f64> {
    let caps = pattern.captures(text)?;
    let amount: f64 = caps[1].replace(',', ".").parse().ok()?;
    Some(amount * multiplier(text))
}

/// The scale word is looked up anywhere in the query, not only next to the
/// number. "millon" is tested first since it contains "mil".
fn multiplier(text: &str) -> f64 {
    if text.contains("millon") {
        1_000_000.0
    } else if text.contains("mil") {
        1_000.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData {
            entities: vec![
                ReferenceEntity::new(2, "Alcaldía de Bogotá".to_string()),
                ReferenceEntity::new(
                    3,
                    "Instituto Distrital de Recreación y Deporte".to_string(),
                ),
                ReferenceEntity::new(1, "Ministerio de Educación Nacional".to_string()),
            ],
            situations: vec![
                ReferenceSituation {
                    id: 1,
                    display_name: "Suscrito".to_string(),
                },
                ReferenceSituation {
                    id: 2,
                    display_name: "En ejecución".to_string(),
                },
                ReferenceSituation {
                    id: 3,
                    display_name: "Finalizado".to_string(),
                },
            ],
        }
    }

    #[test]
    fn empty_text_sets_nothing() {
        let parsed = parse("", &reference());
        assert_eq!(parsed, ParsedQuery::default());
        assert_eq!(parsed.mode(), Mode::Basic);

        let parsed = parse("   \t ", &reference());
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.entity_id, None);
        assert_eq!(parsed.mode(), Mode::Basic);
    }

    #[test]
    fn year_only() {
        let parsed = parse("proyectos del año 2024", &reference());
        assert_eq!(parsed.year, Some(2024));
        assert_eq!(parsed.year_range(), None);
        assert_eq!(parsed.entity_id, None);
        assert_eq!(parsed.situation_id, None);
        assert_eq!(parsed.min_value, None);
        assert_eq!(parsed.max_value, None);
        assert_eq!(parsed.mode(), Mode::Basic);
        assert_eq!(parsed.raw_text, "proyectos del año 2024");
    }

    #[test]
    fn year_accepts_bare_number_and_keywords() {
        assert_eq!(parse("convenios 2019", &reference()).year, Some(2019));
        assert_eq!(parse("Proyectos DEL 2021", &reference()).year, Some(2021));
        assert_eq!(parse("anio 2018", &reference()).year, Some(2018));
        assert_eq!(parse("proyecto 12345", &reference()).year, None);
    }

    #[test]
    fn year_range_forces_advanced() {
        let parsed = parse("proyectos entre 2020 y 2023", &reference());
        assert_eq!(parsed.year_range_start, Some(2020));
        assert_eq!(parsed.year_range_end, Some(2023));
        assert_eq!(parsed.mode(), Mode::Advanced);

        let parsed = parse("desde 2015 hasta 2017", &reference());
        assert_eq!(parsed.year_range(), Some((2015, 2017)));
    }

    #[test]
    fn year_and_range_both_kept() {
        let parsed = parse("proyectos entre 2020 y 2023", &reference());
        assert_eq!(parsed.year, Some(2020));
        assert!(parsed.year_range().is_some());
    }

    #[test]
    fn min_value_in_millions() {
        let parsed = parse("proyectos con valor mayor a 500 millones", &reference());
        assert_eq!(parsed.min_value, Some(500_000_000.0));
        assert_eq!(parsed.max_value, None);
        assert_eq!(parsed.mode(), Mode::Advanced);
    }

    #[test]
    fn value_accepts_decimal_comma() {
        let parsed = parse("valor superior que 2,5 millones", &reference());
        assert_eq!(parsed.min_value, Some(2_500_000.0));

        let parsed = parse("valor menor a 1.5 mil", &reference());
        assert_eq!(parsed.max_value, Some(1_500.0));
    }

    #[test]
    fn value_without_scale_word() {
        let parsed = parse("valor inferior a 80000", &reference());
        assert_eq!(parsed.max_value, Some(80_000.0));
        assert_eq!(parsed.mode(), Mode::Advanced);
    }

    #[test]
    fn scale_word_applies_across_the_whole_text() {
        let parsed = parse("valor mayor a 3 para el programa mil sonrisas", &reference());
        assert_eq!(parsed.min_value, Some(3_000.0));
    }

    #[test]
    fn min_and_max_together() {
        let parsed = parse(
            "valor mayor a 100 millones y valor menor a 900 millones",
            &reference(),
        );
        assert_eq!(parsed.min_value, Some(100_000_000.0));
        assert_eq!(parsed.max_value, Some(900_000_000.0));
    }

    #[test]
    fn subscribed_situation() {
        let parsed = parse("proyectos suscritos", &reference());
        assert_eq!(parsed.situation_id, Some(1));
        assert_eq!(parsed.situation_name.as_deref(), Some("Suscrito"));
    }

    #[test]
    fn situation_by_direct_name() {
        let parsed = parse("proyectos finalizados", &reference());
        assert_eq!(parsed.situation_id, Some(3));
    }

    #[test]
    fn situation_in_execution_without_accent() {
        let parsed = parse("contratos en ejecucion", &reference());
        assert_eq!(parsed.situation_id, Some(2));
    }

    #[test]
    fn subscribed_keyword_without_matching_situation() {
        let mut data = reference();
        data.situations.retain(|s| s.id != 1);
        let parsed = parse("suscritos en ejecucion", &data);
        assert_eq!(parsed.situation_id, None);
    }

    #[test]
    fn entity_by_full_name() {
        let parsed = parse("proyectos con la alcaldía de bogotá", &reference());
        assert_eq!(parsed.entity_id, Some(2));
        assert_eq!(parsed.entity_name.as_deref(), Some("Alcaldía de Bogotá"));
    }

    #[test]
    fn entity_by_name_without_prefix() {
        let parsed = parse("proyectos con educación nacional", &reference());
        assert_eq!(parsed.entity_id, Some(1));
    }

    #[test]
    fn entity_by_keywords() {
        let parsed = parse("convenios de recreación en el distrital", &reference());
        assert_eq!(parsed.entity_id, Some(3));
    }

    #[test]
    fn single_keyword_is_not_enough() {
        let parsed = parse("proyectos de deporte", &reference());
        assert_eq!(parsed.entity_id, None);
    }

    #[test]
    fn keyword_tie_goes_to_first_entity() {
        let entities = vec![
            ReferenceEntity::new(10, "Fondo Regional Andino".to_string()),
            ReferenceEntity::new(11, "Fondo Regional Caribe".to_string()),
        ];
        let found = match_entity("fondo regional", &entities).unwrap();
        assert_eq!(found.id, 10);
    }

    #[test]
    fn short_stripped_name_is_ignored() {
        let entities = vec![ReferenceEntity::new(5, "Alcaldía de Chía".to_string())];
        assert!(match_entity("proyectos en chía", &entities).is_none());
    }

    #[test]
    fn without_reference_data_only_numbers_are_read() {
        let parsed = parse(
            "proyectos suscritos con la alcaldía de bogotá del año 2022",
            &ReferenceData::default(),
        );
        assert_eq!(parsed.year, Some(2022));
        assert_eq!(parsed.entity_id, None);
        assert_eq!(parsed.situation_id, None);
    }
}
