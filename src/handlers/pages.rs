use axum::http::Uri;
use serde::Serialize;

use crate::gate::{EffectiveContext, Principal, RequestContext};
use crate::middleware::ApiResponse;

#[derive(Debug, Serialize)]
pub struct PageShell {
    pub path: String,
    pub principal: Option<Principal>,
    pub effective: Option<EffectiveContext>,
}

/// Stand-in for a server-rendered page once the gate has let the request through
pub async fn page_shell(uri: Uri, context: Option<RequestContext>) -> ApiResponse<PageShell> {
    let (principal, effective) = match context {
        Some(ctx) => (Some(ctx.principal), Some(ctx.effective)),
        None => (None, None),
    };

    ApiResponse::success(PageShell {
        path: uri.path().to_string(),
        principal,
        effective,
    })
}
