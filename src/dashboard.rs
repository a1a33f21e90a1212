use tracing::error;

use crate::{
    database::{Gateway, QueryError},
    interpreter::{format_currency, SituationStyle},
};

/// Shown for active projects that have no situation.
pub(crate) const NO_SITUATION: &str = "Sin situación";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SituationTally {
    pub(crate) situation: String,
    pub(crate) style: SituationStyle,
    pub(crate) count: i64,
    pub(crate) value: String,
}

/// Totals over active projects.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DashboardSummary {
    pub(crate) active_projects: i64,
    pub(crate) total_value: f64,
    pub(crate) formatted_total_value: String,
    pub(crate) by_situation: Vec<SituationTally>,
}

pub(crate) fn summarize<G: Gateway + ?Sized>(
    gateway: &G,
) -> Result<DashboardSummary, QueryError> {
    let counts = gateway.situation_counts().map_err(|e| {
        error!("Problem while summarizing projects. {}", e);
        e
    })?;

    let active_projects = counts.iter().map(|c| c.count).sum();
    let total_value: f64 = counts.iter().map(|c| c.value).sum();
    let by_situation = counts
        .into_iter()
        .map(|c| {
            let situation = c.situation.unwrap_or_else(|| NO_SITUATION.to_string());
            SituationTally {
                style: SituationStyle::classify(&situation),
                situation,
                count: c.count,
                value: format_currency(Some(c.value)),
            }
        })
        .collect();

    Ok(DashboardSummary {
        active_projects,
        total_value,
        formatted_total_value: format_currency(Some(total_value)),
        by_situation,
    })
}
