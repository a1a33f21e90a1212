use rusqlite::{Connection, Row, ToSql};

use super::{fetch, QueryError, SqlValue};

/// One row of the projects relation joined with its entity and situation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProjectRecord {
    pub(crate) id: i64,
    pub(crate) year: i64,
    pub(crate) name: String,
    pub(crate) purpose: Option<String>,
    pub(crate) value: Option<f64>,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
    /// `A` for active projects.
    pub(crate) status: String,
    pub(crate) entity_id: Option<i64>,
    pub(crate) entity_name: Option<String>,
    pub(crate) situation_id: Option<i64>,
    pub(crate) situation_name: Option<String>,
}

impl ProjectRecord {
    /// Reads the column aliases produced by the query renderer.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("anio")?,
            name: row.get("nombre")?,
            purpose: row.get("objeto")?,
            value: row.get("valor")?,
            start_date: row.get("fecha_inicio")?,
            end_date: row.get("fecha_fin")?,
            status: row.get("estado")?,
            entity_id: row.get("entidad_id")?,
            entity_name: row.get("entidad")?,
            situation_id: row.get("situacion_id")?,
            situation_name: row.get("situacion")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SituationCount {
    pub(crate) situation: Option<String>,
    pub(crate) count: i64,
    pub(crate) value: f64,
}

pub(super) fn select_projects(
    conn: &Connection,
    sql: &str,
    params: &[(&'static str, SqlValue)],
) -> Result<Vec<ProjectRecord>, QueryError> {
    let bound: Vec<(&str, &dyn ToSql)> = params
        .iter()
        .map(|(name, value)| (*name, value as &dyn ToSql))
        .collect();
    fetch(conn, sql, bound.as_slice(), ProjectRecord::from_row)
}

pub(super) fn select_situation_counts(
    conn: &Connection,
) -> Result<Vec<SituationCount>, QueryError> {
    fetch(
        conn,
        "SELECT s.descripcion AS situacion, COUNT(*) AS total, COALESCE(SUM(p.valor), 0) AS valor
         FROM proyecto p
         LEFT JOIN situacion s ON s.id = p.situacion_id
         WHERE p.estado = 'A'
         GROUP BY p.situacion_id, s.descripcion
         ORDER BY total DESC, situacion",
        [],
        |row| {
            Ok(SituationCount {
                situation: row.get("situacion")?,
                count: row.get("total")?,
                value: row.get("valor")?,
            })
        },
    )
}
