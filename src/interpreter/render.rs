use super::parse::ParsedQuery;
use crate::database::SqlValue;

/// Rows returned by a single query.
pub(crate) const ROW_LIMIT: usize = 50;

const SELECT: &str = "SELECT p.id AS id, p.anio AS anio, p.nombre AS nombre, p.objeto AS objeto, \
p.valor AS valor, p.fecha_inicio AS fecha_inicio, p.fecha_fin AS fecha_fin, p.estado AS estado, \
p.entidad_id AS entidad_id, e.nombre AS entidad, p.situacion_id AS situacion_id, \
s.descripcion AS situacion \
FROM proyecto p \
LEFT JOIN entidad e ON e.id = p.entidad_id \
LEFT JOIN situacion s ON s.id = p.situacion_id \
WHERE p.estado = 'A'";

/// SQL text with named placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedQuery {
    pub(crate) sql: String,
    pub(crate) params: Vec<(&'static str, SqlValue)>,
}

/// Builds the statement for `parsed`. Only recognised filters add a clause,
/// always in the same order, and every value travels as a bound parameter.
pub(crate) fn render(parsed: &ParsedQuery) -> RenderedQuery {
    let mut sql = String::from(SELECT);
    let mut params = Vec::new();

    if let Some(year) = parsed.year {
        sql.push_str(" AND p.anio = :anio");
        params.push((":anio", SqlValue::Integer(year.into())));
    }
    if let Some((start, end)) = parsed.year_range() {
        sql.push_str(" AND p.anio BETWEEN :anio_inicio AND :anio_fin");
        params.push((":anio_inicio", SqlValue::Integer(start.into())));
        params.push((":anio_fin", SqlValue::Integer(end.into())));
    }
    if let Some(entity) = parsed.entity_id {
        sql.push_str(" AND p.entidad_id = :entidad");
        params.push((":entidad", SqlValue::Integer(entity)));
    }
    if let Some(situation) = parsed.situation_id {
        sql.push_str(" AND p.situacion_id = :situacion");
        params.push((":situacion", SqlValue::Integer(situation)));
    }
    if let Some(min) = parsed.min_value {
        sql.push_str(" AND p.valor >= :valor_min");
        params.push((":valor_min", SqlValue::Real(min)));
    }
    if let Some(max) = parsed.max_value {
        sql.push_str(" AND p.valor <= :valor_max");
        params.push((":valor_max", SqlValue::Real(max)));
    }

    sql.push_str(&format!(
        " ORDER BY p.anio DESC, p.fecha_inicio DESC LIMIT {ROW_LIMIT}"
    ));
    RenderedQuery { sql, params }
}
