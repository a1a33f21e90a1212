//! Natural-language project queries.
//!
//! A query goes through four steps, each usable on its own: [`parse`] reads
//! filters out of the text, [`render`] turns them into a parameterized
//! statement, [`Interpreter::execute`] runs it, and [`present`] decides what
//! the caller shows.

pub(crate) mod format;
pub(crate) mod parse;
pub(crate) mod render;

use serde::Serialize;
use tracing::{error, warn};

pub(crate) use self::format::{format_currency, format_date, SituationStyle};
pub(crate) use self::parse::{Mode, ParsedQuery};
pub(crate) use self::render::RenderedQuery;
use crate::database::{Gateway, ProjectRecord, QueryError, ReferenceData};

/// Shown instead of the driver's message when a query cannot run.
pub(crate) const FAILURE_MESSAGE: &str =
    "No fue posible ejecutar la consulta. Intente nuevamente más tarde.";

/// A stored project plus its display fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProjectRow {
    pub(crate) record: ProjectRecord,
    pub(crate) start_date_display: String,
    pub(crate) end_date_display: String,
    pub(crate) value_display: String,
}

impl From<ProjectRecord> for ProjectRow {
    fn from(record: ProjectRecord) -> Self {
        Self {
            start_date_display: format_date(record.start_date.as_deref()),
            end_date_display: format_date(record.end_date.as_deref()),
            value_display: format_currency(record.value),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResultSet {
    pub(crate) rows: Vec<ProjectRow>,
    pub(crate) parsed: ParsedQuery,
}

pub(crate) type QueryResult = Result<ResultSet, QueryError>;

/// One recognised filter, labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Understood {
    pub(crate) label: &'static str,
    pub(crate) value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DisplayRow {
    pub(crate) project_id: i64,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) purpose: String,
    pub(crate) entity_id: Option<i64>,
    pub(crate) entity: String,
    pub(crate) situation_id: Option<i64>,
    pub(crate) situation: String,
    pub(crate) style: SituationStyle,
    pub(crate) value: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) status: String,
}

impl From<&ProjectRow> for DisplayRow {
    fn from(row: &ProjectRow) -> Self {
        let record = &row.record;
        let situation = record.situation_name.clone().unwrap_or_default();
        Self {
            project_id: record.id,
            code: format!("{}-{}", record.year, record.id),
            name: record.name.clone(),
            purpose: record.purpose.clone().unwrap_or_default(),
            entity_id: record.entity_id,
            entity: record.entity_name.clone().unwrap_or_default(),
            situation_id: record.situation_id,
            style: SituationStyle::classify(&situation),
            situation,
            value: row.value_display.clone(),
            start_date: row.start_date_display.clone(),
            end_date: row.end_date_display.clone(),
            status: record.status.clone(),
        }
    }
}

/// What the caller shows for a finished query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Presentation {
    Error {
        message: String,
    },
    Empty {
        mode: Mode,
        understood: Vec<Understood>,
    },
    Results {
        mode: Mode,
        understood: Vec<Understood>,
        rows: Vec<DisplayRow>,
    },
}

/// Request-scoped pipeline over one store handle.
pub(crate) struct Interpreter<G: Gateway> {
    gateway: G,
    reference: ReferenceData,
}

impl<G: Gateway> Interpreter<G> {
    /// Loads the reference lists through `gateway`. Never fails; see
    /// [`ReferenceData::load`].
    pub(crate) fn new(gateway: G) -> Self {
        let reference = ReferenceData::load(&gateway);
        Self { gateway, reference }
    }

    pub(crate) fn parse(&self, text: &str) -> ParsedQuery {
        parse::parse(text, &self.reference)
    }

    pub(crate) fn execute(&self, rendered: &RenderedQuery, parsed: ParsedQuery) -> QueryResult {
        match self.gateway.projects(&rendered.sql, &rendered.params) {
            Ok(records) => Ok(ResultSet {
                rows: records.into_iter().map(ProjectRow::from).collect(),
                parsed,
            }),
            Err(e) => {
                error!("Problem while running project query {:?}. {}", parsed.raw_text, e);
                Err(e)
            }
        }
    }

    /// Runs the whole pipeline for `text`.
    pub(crate) fn consult(&self, text: &str) -> Presentation {
        let parsed = self.parse(text);
        let rendered = render::render(&parsed);
        present(&self.execute(&rendered, parsed))
    }

    /// Releases the store handle. A failure is only logged.
    pub(crate) fn close(self) {
        if let Err(e) = self.gateway.close() {
            warn!("Problem while closing the database. {}", e);
        }
    }
}

pub(crate) fn present(result: &QueryResult) -> Presentation {
    let set = match result {
        Ok(set) => set,
        Err(_) => {
            return Presentation::Error {
                message: FAILURE_MESSAGE.to_string(),
            }
        }
    };
    let mode = set.parsed.mode();
    let understood = understood(&set.parsed);
    if set.rows.is_empty() {
        Presentation::Empty { mode, understood }
    } else {
        Presentation::Results {
            mode,
            understood,
            rows: set.rows.iter().map(DisplayRow::from).collect(),
        }
    }
}

/// Labels for the filters that were set, in rendering order.
pub(crate) fn understood(parsed: &ParsedQuery) -> Vec<Understood> {
    let mut out = Vec::new();
    let mut push = |label, value| out.push(Understood { label, value });
    if let Some(year) = parsed.year {
        push("Año", year.to_string());
    }
    if let Some((start, end)) = parsed.year_range() {
        push("Rango de años", format!("{start} - {end}"));
    }
    if let Some(name) = parsed.entity_name.as_ref().filter(|_| parsed.entity_id.is_some()) {
        push("Entidad", name.clone());
    }
    if let Some(name) = parsed
        .situation_name
        .as_ref()
        .filter(|_| parsed.situation_id.is_some())
    {
        push("Situación", name.clone());
    }
    if let Some(min) = parsed.min_value {
        push("Valor mínimo", format_currency(Some(min)));
    }
    if let Some(max) = parsed.max_value {
        push("Valor máximo", format_currency(Some(max)));
    }
    out
}
