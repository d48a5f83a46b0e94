use crate::api::schema::{CreateReplyRequest, RepliesQuery, ReplyJson};
use crate::api::{ApiError, RequestContext, RestResponse, SharedState};
use crate::core::TicketId;
use crate::service::NewReply;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};

/// `GET /wp/v2/comments?post=ID&order=asc`
pub async fn list(
    State(state): State<SharedState>,
    ctx: RequestContext,
    query: Result<Query<RepliesQuery>, QueryRejection>,
) -> Result<RestResponse<Vec<ReplyJson>>, ApiError> {
    let Query(query) = query?;
    let replies = state
        .service
        .list_replies(&ctx.caller, TicketId(query.post), query.order.unwrap_or_default())
        .map_err(|e| ApiError::denied_as(e, "rest_cannot_read_post"))?;
    let total = replies.len();
    let items: Vec<ReplyJson> = replies.iter().map(ReplyJson::from).collect();
    Ok(RestResponse::ok(items)
        .with_totals(total, u32::from(total > 0))
        .with_context(&ctx))
}

/// `POST /wp/v2/comments`
pub async fn create(
    State(state): State<SharedState>,
    ctx: RequestContext,
    payload: Result<Json<CreateReplyRequest>, JsonRejection>,
) -> Result<RestResponse<ReplyJson>, ApiError> {
    let Json(request) = payload?;
    let reply = state
        .service
        .post_reply(
            &ctx.caller,
            NewReply {
                ticket_id: TicketId(request.post),
                content: request.content,
            },
        )
        .map_err(|e| ApiError::denied_as(e, "rest_comment_login_required"))?;
    Ok(RestResponse::created(ReplyJson::from(&reply)).with_context(&ctx))
}
