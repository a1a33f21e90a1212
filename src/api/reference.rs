use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    api,
    database::{ReferenceData, ReferenceEntity, ReferenceSituation},
};

/// An entity the natural-language query can recognise.
#[derive(SimpleObject)]
struct Entity {
    id: i64,
    name: String,
    /// Words that count towards a partial match.
    keywords: Vec<String>,
}

#[derive(SimpleObject)]
struct Situation {
    id: i64,
    name: String,
}

impl From<ReferenceEntity> for Entity {
    fn from(entity: ReferenceEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.display_name,
            keywords: entity.keywords,
        }
    }
}

impl From<ReferenceSituation> for Situation {
    fn from(situation: ReferenceSituation) -> Self {
        Self {
            id: situation.id,
            name: situation.display_name,
        }
    }
}

#[derive(Default)]
pub(super) struct ReferenceQuery;

#[Object]
impl ReferenceQuery {
    /// Entities ordered by name.
    async fn entities(&self, ctx: &Context<'_>) -> Result<Vec<Entity>> {
        let reference = api::with_connection(ctx, |conn| Ok(ReferenceData::load(&conn))).await?;
        Ok(reference.entities.into_iter().map(Entity::from).collect())
    }

    /// Situations ordered by id.
    async fn situations(&self, ctx: &Context<'_>) -> Result<Vec<Situation>> {
        let reference = api::with_connection(ctx, |conn| Ok(ReferenceData::load(&conn))).await?;
        Ok(reference
            .situations
            .into_iter()
            .map(Situation::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::TestSchema;

    #[tokio::test]
    async fn entities_empty() {
        let schema = TestSchema::new();
        let res = schema.execute("{ entities { id } situations { id } }").await;
        assert_eq!(
            res.data.into_json().unwrap(),
            serde_json::json!({ "entities": [], "situations": [] })
        );
    }

    #[tokio::test]
    async fn situations_in_id_order() {
        let schema = TestSchema::new();
        schema.seed_reference();
        let res = schema.execute("{ situations { id } }").await;
        assert_eq!(
            res.data.to_string(),
            "{situations: [{id: 1}, {id: 2}, {id: 3}]}"
        );
    }

    #[tokio::test]
    async fn entities_with_keywords() {
        let schema = TestSchema::new();
        schema.seed_reference();
        let res = schema.execute("{ entities { id keywords } }").await;
        assert_eq!(
            res.data.into_json().unwrap(),
            serde_json::json!({
                "entities": [
                    { "id": 2, "keywords": ["alcaldía", "bogotá"] },
                    {
                        "id": 3,
                        "keywords": ["instituto", "distrital", "recreación", "deporte"]
                    },
                    { "id": 1, "keywords": ["ministerio", "educación", "nacional"] },
                ]
            })
        );
    }
}
