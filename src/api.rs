mod dashboard;
mod natural_query;
mod reference;

use async_graphql::{EmptyMutation, EmptySubscription, Enum, MergedObject};
use tracing::error;

pub(crate) use self::natural_query::consult;
use crate::{
    database::Database,
    interpreter::{Mode, SituationStyle, FAILURE_MESSAGE},
};

/// A set of queries defined in the schema.
///
/// This is exposed only for [`Schema`], and not used directly.
#[derive(Default, MergedObject)]
pub(crate) struct Query(
    natural_query::NaturalQuery,
    dashboard::DashboardQuery,
    reference::ReferenceQuery,
);

pub(crate) type Schema = async_graphql::Schema<Query, EmptyMutation, EmptySubscription>;

pub(crate) fn schema(database: Database) -> Schema {
    Schema::build(Query::default(), EmptyMutation, EmptySubscription)
        .data(database)
        .finish()
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
enum QueryMode {
    Basic,
    Advanced,
}

impl From<Mode> for QueryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Basic => Self::Basic,
            Mode::Advanced => Self::Advanced,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
enum BadgeStyle {
    Info,
    Warning,
    Success,
    Neutral,
}

impl From<SituationStyle> for BadgeStyle {
    fn from(style: SituationStyle) -> Self {
        match style {
            SituationStyle::Info => Self::Info,
            SituationStyle::Warning => Self::Warning,
            SituationStyle::Success => Self::Success,
            SituationStyle::Neutral => Self::Neutral,
        }
    }
}

/// Runs `work` on a fresh connection off the async runtime.
///
/// Store failures are logged with their detail and reported to the client
/// with a generic message.
async fn with_connection<T, F>(
    ctx: &async_graphql::Context<'_>,
    work: F,
) -> async_graphql::Result<T>
where
    T: Send + 'static,
    F: FnOnce(rusqlite::Connection) -> anyhow::Result<T> + Send + 'static,
{
    let database = ctx.data::<Database>()?.clone();
    let outcome = tokio::task::spawn_blocking(move || work(database.open()?)).await?;
    outcome.map_err(|e| {
        error!("Problem while reading the database. {:#}", e);
        FAILURE_MESSAGE.into()
    })
}

#[cfg(test)]
struct TestSchema {
    _dir: tempfile::TempDir, // to prevent the data directory from being deleted while the test is running
    db: Database,
    schema: Schema,
}

#[cfg(test)]
impl TestSchema {
    fn new() -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let db = Database::connect(&db_dir.path().join("sgpoe.db")).unwrap();
        let schema = schema(db.clone());
        Self {
            _dir: db_dir,
            db,
            schema,
        }
    }

    fn seed_reference(&self) -> rusqlite::Connection {
        let conn = self.db.open().unwrap();
        crate::database::fixtures::insert_reference(&conn);
        conn
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        let request: async_graphql::Request = query.into();
        self.schema.execute(request).await
    }
}
