use crate::api::schema::{CreateTicketRequest, ListQuery, TicketJson, UpdateTicketRequest};
use crate::api::{ApiError, RequestContext, RestResponse, SharedState};
use crate::core::{TermId, Ticket, TicketId, User, UserId};
use crate::error::Result;
use crate::service::{NewTicket, TicketUpdate};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use std::collections::BTreeMap;

type Payload<T> = std::result::Result<Json<T>, JsonRejection>;

fn term_ids(ids: Vec<u64>) -> Vec<TermId> {
    ids.into_iter().map(TermId).collect()
}

/// Serialize tickets, embedding each author when asked
fn to_json(state: &SharedState, tickets: &[Ticket], embed: bool) -> Result<Vec<TicketJson>> {
    let mut authors: BTreeMap<UserId, Option<User>> = BTreeMap::new();
    tickets
        .iter()
        .map(|ticket| {
            if !embed {
                return Ok(TicketJson::new(ticket, None));
            }
            if !authors.contains_key(&ticket.author) {
                authors.insert(ticket.author, state.service.user(ticket.author)?);
            }
            let author = authors.get(&ticket.author).and_then(Option::as_ref);
            Ok(TicketJson::new(ticket, author))
        })
        .collect()
}

/// `GET /wp/v2/tickefic/tickets`
pub async fn list(
    State(state): State<SharedState>,
    ctx: RequestContext,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> std::result::Result<RestResponse<Vec<TicketJson>>, ApiError> {
    let Query(query) = query?;
    let page = state.service.list_tickets(&ctx.caller, &query.params())?;
    let items = to_json(&state, &page.items, query.wants_embed())?;
    Ok(RestResponse::ok(items)
        .with_totals(page.total, page.total_pages)
        .with_context(&ctx))
}

/// `POST /wp/v2/tickefic/tickets`
pub async fn create(
    State(state): State<SharedState>,
    ctx: RequestContext,
    payload: Payload<CreateTicketRequest>,
) -> std::result::Result<RestResponse<TicketJson>, ApiError> {
    let Json(request) = payload?;
    let input = NewTicket {
        title: request.title,
        content: request.content,
        post_status: request.status,
        meta: request.meta,
        categories: term_ids(request.tickefic_cat),
    };
    let ticket = state
        .service
        .create_ticket(&ctx.caller, input)
        .map_err(|e| ApiError::denied_as(e, "rest_cannot_create"))?;
    let author = state.service.user(ticket.author)?;
    Ok(RestResponse::created(TicketJson::new(&ticket, author.as_ref())).with_context(&ctx))
}

/// `GET /wp/v2/tickefic/tickets/:id`
pub async fn get(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<u64>,
) -> std::result::Result<RestResponse<TicketJson>, ApiError> {
    let ticket = state
        .service
        .get_ticket(&ctx.caller, TicketId(id))
        .map_err(|e| ApiError::denied_as(e, "rest_forbidden"))?;
    Ok(RestResponse::ok(TicketJson::new(&ticket, None)).with_context(&ctx))
}

/// `POST|PUT|PATCH /wp/v2/tickefic/tickets/:id`
pub async fn update(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<u64>,
    payload: Payload<UpdateTicketRequest>,
) -> std::result::Result<RestResponse<TicketJson>, ApiError> {
    let Json(request) = payload?;
    let update = TicketUpdate {
        title: request.title,
        content: request.content,
        post_status: request.status,
        meta: request.meta,
        categories: request.tickefic_cat.map(term_ids),
    };
    let ticket = state
        .service
        .update_ticket(&ctx.caller, TicketId(id), update)
        .map_err(|e| ApiError::denied_as(e, "rest_cannot_edit"))?;
    Ok(RestResponse::ok(TicketJson::new(&ticket, None)).with_context(&ctx))
}
