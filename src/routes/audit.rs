use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::models::AuditEvent;
use crate::pagination::{PageRequest, Paginated};
use crate::routes::{non_blank, PageResult};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListAuditEvents {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub resource_type: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListAuditEvents>,
) -> PageResult<AuditEvent> {
    auth.require_admin()?;
    let page = PageRequest::new(q.page, q.per_page);
    let resource_type = non_blank(q.resource_type.as_deref());
    let events = db::audit::list(&state.pool, resource_type, page.limit(), page.offset()).await?;
    let total = db::audit::count(&state.pool, resource_type).await?;
    Ok(Json(Paginated::new(events, page, total)))
}
