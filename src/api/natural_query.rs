use async_graphql::{Context, Object, Result, SimpleObject, Union};
use tracing::error;

use crate::{
    api::{BadgeStyle, QueryMode},
    database::Database,
    interpreter::{DisplayRow, Interpreter, Presentation, Understood, FAILURE_MESSAGE},
};

/// Queries with fewer characters than this are rejected before parsing.
const MIN_QUERY_LEN: usize = 3;

#[derive(SimpleObject)]
struct ErrorPanel {
    message: String,
}

#[derive(SimpleObject)]
struct EmptyPanel {
    mode: QueryMode,
    /// The filters that were recognised.
    understood: Vec<UnderstoodFilter>,
}

#[derive(SimpleObject)]
struct ResultsPanel {
    mode: QueryMode,
    /// The filters that were recognised.
    understood: Vec<UnderstoodFilter>,
    rows: Vec<ProjectRow>,
}

#[derive(Union)]
enum Panel {
    Error(ErrorPanel),
    Empty(EmptyPanel),
    Results(ResultsPanel),
}

#[derive(SimpleObject)]
struct UnderstoodFilter {
    label: String,
    value: String,
}

#[derive(SimpleObject)]
struct ProjectRow {
    /// Identifier used to open the project detail.
    project_id: i64,
    /// `year-id`.
    code: String,
    name: String,
    /// The project's stated purpose, empty when not recorded.
    purpose: String,
    entity_id: Option<i64>,
    entity: String,
    situation_id: Option<i64>,
    situation: String,
    style: BadgeStyle,
    /// Formatted as `$1.234.567`.
    value: String,
    /// Formatted as `dd/mm/yyyy`.
    start_date: String,
    /// Formatted as `dd/mm/yyyy`.
    end_date: String,
    status: String,
}

impl From<Understood> for UnderstoodFilter {
    fn from(understood: Understood) -> Self {
        Self {
            label: understood.label.to_string(),
            value: understood.value,
        }
    }
}

impl From<DisplayRow> for ProjectRow {
    fn from(row: DisplayRow) -> Self {
        Self {
            project_id: row.project_id,
            code: row.code,
            name: row.name,
            purpose: row.purpose,
            entity_id: row.entity_id,
            entity: row.entity,
            situation_id: row.situation_id,
            situation: row.situation,
            style: row.style.into(),
            value: row.value,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status,
        }
    }
}

impl From<Presentation> for Panel {
    fn from(presentation: Presentation) -> Self {
        let understood = |list: Vec<Understood>| -> Vec<UnderstoodFilter> {
            list.into_iter().map(UnderstoodFilter::from).collect()
        };
        match presentation {
            Presentation::Error { message } => Self::Error(ErrorPanel { message }),
            Presentation::Empty { mode, understood: u } => Self::Empty(EmptyPanel {
                mode: mode.into(),
                understood: understood(u),
            }),
            Presentation::Results {
                mode,
                understood: u,
                rows,
            } => Self::Results(ResultsPanel {
                mode: mode.into(),
                understood: understood(u),
                rows: rows.into_iter().map(ProjectRow::from).collect(),
            }),
        }
    }
}

/// Runs one natural-language query on its own connection.
///
/// A connection that cannot be opened yields the failure panel, like any
/// other store failure.
pub(crate) fn consult(database: &Database, text: &str) -> Presentation {
    let conn = match database.open() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Problem while opening the database. {:#}", e);
            return Presentation::Error {
                message: FAILURE_MESSAGE.to_string(),
            };
        }
    };
    let interpreter = Interpreter::new(conn);
    let presentation = interpreter.consult(text);
    interpreter.close();
    presentation
}

#[derive(Default)]
pub(super) struct NaturalQuery;

#[Object]
impl NaturalQuery {
    /// Interprets a Spanish free-text question about projects.
    async fn natural_query(&self, ctx: &Context<'_>, text: String) -> Result<Panel> {
        if text.trim().chars().count() < MIN_QUERY_LEN {
            return Err(
                format!("La consulta debe tener al menos {MIN_QUERY_LEN} caracteres.").into(),
            );
        }
        let database = ctx.data::<Database>()?.clone();
        let presentation = tokio::task::spawn_blocking(move || consult(&database, &text)).await?;
        Ok(presentation.into())
    }
}
