use std::{convert::Infallible, net::SocketAddr, path::PathBuf};

use async_graphql::http::GraphiQLSource;
use async_graphql_warp::{GraphQLBadRequest, GraphQLResponse};
use tracing::info;
use warp::{http::StatusCode, Filter, Rejection, Reply};

use crate::api::Schema;

const GRAPHQL_PATH: &str = "graphql";

/// Certificate and key paths for HTTPS.
pub(crate) struct Tls {
    pub(crate) cert: PathBuf,
    pub(crate) key: PathBuf,
}

/// Serves the GraphQL API at `/graphql` and an in-browser IDE at `/`.
pub(crate) async fn serve(schema: Schema, addr: SocketAddr, tls: Option<Tls>) {
    let graphql = warp::path(GRAPHQL_PATH)
        .and(warp::path::end())
        .and(async_graphql_warp::graphql(schema))
        .and_then(
            |(schema, request): (Schema, async_graphql::Request)| async move {
                Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
            },
        );

    let ide = warp::path::end().and(warp::get()).map(|| {
        warp::reply::html(
            GraphiQLSource::build()
                .endpoint(&format!("/{GRAPHQL_PATH}"))
                .finish(),
        )
    });

    let routes = graphql.or(ide).recover(recover);

    match tls {
        Some(tls) => {
            info!("Listening on https://{}", addr);
            warp::serve(routes)
                .tls()
                .cert_path(tls.cert)
                .key_path(tls.key)
                .run(addr)
                .await;
        }
        None => {
            info!("Listening on http://{}", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}

async fn recover(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(GraphQLBadRequest(err)) = err.find() {
        return Ok(warp::reply::with_status(
            err.to_string(),
            StatusCode::BAD_REQUEST,
        ));
    }
    if err.is_not_found() {
        return Ok(warp::reply::with_status(
            "NOT_FOUND".to_string(),
            StatusCode::NOT_FOUND,
        ));
    }
    Ok(warp::reply::with_status(
        "INTERNAL_SERVER_ERROR".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
