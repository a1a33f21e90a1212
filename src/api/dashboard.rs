use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    api::{self, BadgeStyle},
    dashboard::{self, DashboardSummary, SituationTally},
};

#[derive(SimpleObject)]
struct Dashboard {
    /// The number of active projects.
    active_projects: i64,
    /// The sum of the values of active projects.
    total_value: f64,
    /// `total_value` formatted as `$1.234.567`.
    formatted_total_value: String,
    /// Active projects grouped by situation, largest group first.
    by_situation: Vec<SituationCount>,
}

#[derive(SimpleObject)]
struct SituationCount {
    situation: String,
    style: BadgeStyle,
    count: i64,
    value: String,
}

impl From<SituationTally> for SituationCount {
    fn from(tally: SituationTally) -> Self {
        Self {
            situation: tally.situation,
            style: tally.style.into(),
            count: tally.count,
            value: tally.value,
        }
    }
}

impl From<DashboardSummary> for Dashboard {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            active_projects: summary.active_projects,
            total_value: summary.total_value,
            formatted_total_value: summary.formatted_total_value,
            by_situation: summary
                .by_situation
                .into_iter()
                .map(SituationCount::from)
                .collect(),
        }
    }
}

#[derive(Default)]
pub(super) struct DashboardQuery;

#[Object]
impl DashboardQuery {
    async fn dashboard(&self, ctx: &Context<'_>) -> Result<Dashboard> {
        let summary = api::with_connection(ctx, |conn| Ok(dashboard::summarize(&conn)?)).await?;
        Ok(summary.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::TestSchema,
        database::fixtures::{self, ProjectSeed},
        interpreter::FAILURE_MESSAGE,
    };

    #[tokio::test]
    async fn dashboard_empty() {
        let schema = TestSchema::new();
        let query = r"
        {
            dashboard {
                activeProjects
                formattedTotalValue
                bySituation {
                    situation
                }
            }
        }";
        let res = schema.execute(query).await;
        assert_eq!(
            res.data.to_string(),
            r#"{dashboard: {activeProjects: 0, formattedTotalValue: "$0", bySituation: []}}"#
        );
    }

    #[tokio::test]
    async fn dashboard_groups_by_situation() {
        let schema = TestSchema::new();
        let conn = schema.seed_reference();
        for (id, situation) in [(1, Some(2)), (2, Some(2)), (3, None)] {
            fixtures::insert_project(
                &conn,
                &ProjectSeed {
                    id,
                    year: 2024,
                    name: "Proyecto",
                    value: Some(1_000_000.0),
                    situation,
                    ..Default::default()
                },
            );
        }

        let query = r"
        {
            dashboard {
                activeProjects
                formattedTotalValue
                bySituation {
                    situation
                    style
                    count
                }
            }
        }";
        let res = schema.execute(query).await;
        assert_eq!(
            res.data.into_json().unwrap(),
            serde_json::json!({
                "dashboard": {
                    "activeProjects": 3,
                    "formattedTotalValue": "$3.000.000",
                    "bySituation": [
                        { "situation": "En ejecución", "style": "INFO", "count": 2 },
                        { "situation": "Sin situación", "style": "NEUTRAL", "count": 1 },
                    ],
                }
            })
        );
    }

    #[tokio::test]
    async fn dashboard_failure_is_generic() {
        let schema = TestSchema::new();
        schema
            .db
            .open()
            .unwrap()
            .execute_batch("DROP TABLE proyecto")
            .unwrap();

        let res = schema.execute("{ dashboard { activeProjects } }").await;
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].message, FAILURE_MESSAGE);
    }
}
