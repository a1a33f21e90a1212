pub(crate) mod project;
pub(crate) mod reference;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{
    types::{ToSqlOutput, Value},
    Connection, Params, Row, ToSql,
};
use thiserror::Error;

pub(crate) use self::project::{ProjectRecord, SituationCount};
pub(crate) use self::reference::{ReferenceData, ReferenceEntity, ReferenceSituation};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS entidad (
        id INTEGER PRIMARY KEY,
        nombre TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS situacion (
        id INTEGER PRIMARY KEY,
        descripcion TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS proyecto (
        id INTEGER PRIMARY KEY,
        anio INTEGER NOT NULL,
        nombre TEXT NOT NULL,
        objeto TEXT,
        valor REAL,
        -- ISO 8601 text (YYYY-MM-DD); results are sorted on it as text.
        fecha_inicio TEXT,
        fecha_fin TEXT,
        estado TEXT NOT NULL DEFAULT 'A',
        entidad_id INTEGER REFERENCES entidad (id),
        situacion_id INTEGER REFERENCES situacion (id)
    );
";

/// Failure of a statement sent to the relational store.
///
/// The message is the driver's own text.
#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum QueryError {
    #[error("failed to prepare query: {0}")]
    Prepare(String),

    #[error("failed to execute query: {0}")]
    Execute(String),
}

/// A value bound to a named placeholder of a rendered query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Integer(i64),
    Real(f64),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
        })
    }
}

/// Read access to the projects schema.
///
/// Every method prepares, runs and releases its own statement, so a failure
/// never leaves a statement handle behind.
pub(crate) trait Gateway {
    /// Entities as `(id, display name)`, ordered by display name.
    fn entities(&self) -> Result<Vec<(i64, String)>, QueryError>;

    /// Situations as `(id, display name)`, ordered by id.
    fn situations(&self) -> Result<Vec<(i64, String)>, QueryError>;

    fn projects(
        &self,
        sql: &str,
        params: &[(&'static str, SqlValue)],
    ) -> Result<Vec<ProjectRecord>, QueryError>;

    /// Active projects grouped by situation.
    fn situation_counts(&self) -> Result<Vec<SituationCount>, QueryError>;

    /// Releases the underlying handle.
    fn close(self) -> Result<(), QueryError>
    where
        Self: Sized,
    {
        Ok(())
    }
}

impl Gateway for Connection {
    fn entities(&self) -> Result<Vec<(i64, String)>, QueryError> {
        reference::select_entities(self)
    }

    fn situations(&self) -> Result<Vec<(i64, String)>, QueryError> {
        reference::select_situations(self)
    }

    fn projects(
        &self,
        sql: &str,
        params: &[(&'static str, SqlValue)],
    ) -> Result<Vec<ProjectRecord>, QueryError> {
        project::select_projects(self, sql, params)
    }

    fn situation_counts(&self) -> Result<Vec<SituationCount>, QueryError> {
        project::select_situation_counts(self)
    }

    fn close(self) -> Result<(), QueryError> {
        Connection::close(self).map_err(|(_, e)| QueryError::Execute(e.to_string()))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Database {
    path: PathBuf,
}

impl Database {
    /// Opens the database file once to make sure the schema exists.
    pub(crate) fn connect(path: &Path) -> Result<Database> {
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open database at {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("cannot create the projects schema")?;
        Ok(Database {
            path: path.to_path_buf(),
        })
    }

    /// A fresh connection, owned by whoever serves the current request.
    pub(crate) fn open(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("cannot open database at {}", self.path.display()))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

fn fetch<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>, QueryError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| QueryError::Prepare(e.to_string()))?;
    let rows = stmt
        .query_map(params, map)
        .map_err(|e| QueryError::Execute(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| QueryError::Execute(e.to_string()))?);
    }
    Ok(out)
}
