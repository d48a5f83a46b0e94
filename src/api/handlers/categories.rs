use crate::api::schema::TermJson;
use crate::api::{ApiError, RequestContext, RestResponse, SharedState};
use axum::extract::State;

/// `GET /wp/v2/tickefic_cat`
pub async fn list(
    State(state): State<SharedState>,
    ctx: RequestContext,
) -> Result<RestResponse<Vec<TermJson>>, ApiError> {
    let terms: Vec<TermJson> = state.service.categories()?.iter().map(TermJson::from).collect();
    let total = terms.len();
    Ok(RestResponse::ok(terms)
        .with_totals(total, u32::from(total > 0))
        .with_context(&ctx))
}
