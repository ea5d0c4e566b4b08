use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::services::dashboard_service::{
    self, dashboard_location, read_row_fields, DashboardQuery, DashboardRender, DashboardView,
    EditState, Notice, ParticipationForm,
};
use crate::web::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub view: DashboardView,
    pub version: &'static str,
}

fn render_page<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "template_render_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Renders the dashboard around a fresh list. A failed list fetch still shows
/// the page, with a 502.
async fn show_dashboard(
    state: &AppState,
    query: &DashboardQuery,
    render: DashboardRender,
    status: StatusCode,
) -> Response {
    let page = dashboard_service::load_dashboard(&state.api, query, render).await;
    let status = if page.list_failed {
        StatusCode::BAD_GATEWAY
    } else {
        status
    };
    render_page(
        status,
        DashboardTemplate {
            view: page.view,
            version: VERSION,
        },
    )
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let render = DashboardRender::from_query(&query);
    show_dashboard(&state, &query, render, StatusCode::OK).await
}

pub async fn create_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
    Form(form): Form<ParticipationForm>,
) -> Response {
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            info!(invalid_fields = errors.len(), "participation_form_rejected");
            let render = DashboardRender {
                create_form: form,
                create_errors: errors,
                ..DashboardRender::from_query(&query)
            };
            return show_dashboard(&state, &query, render, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.api.create(&data).await {
        Ok(()) => Redirect::to(&dashboard_location(
            EditState::default(),
            Some(Notice::Created),
            query.name_filter(),
        ))
        .into_response(),
        Err(e) => {
            warn!(status = %e.status(), error = %e, "participation_create_failed");
            let render = DashboardRender {
                create_form: form,
                error_message: Some(e.user_message()),
                ..DashboardRender::from_query(&query)
            };
            show_dashboard(&state, &query, render, StatusCode::BAD_GATEWAY).await
        }
    }
}

/// Save or cancel for the row in inline edit mode. The posted form carries the
/// row's inputs as `firstName_{id}`, `lastName_{id}` and `percentage_{id}`.
pub async fn save_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DashboardQuery>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut edit = EditState::editing(id);

    match fields.get("action").map(String::as_str).unwrap_or("save") {
        "save" => {}
        "cancel" => {
            edit.cancel();
            return Redirect::to(&dashboard_location(edit, None, query.name_filter()))
                .into_response();
        }
        _ => return StatusCode::BAD_REQUEST.into_response(),
    }

    let inputs = read_row_fields(id, &fields);
    let data = match inputs.validate() {
        Ok(data) => data,
        Err(errors) => {
            info!(id, invalid_fields = errors.len(), "participation_row_rejected");
            let render = DashboardRender {
                edit,
                row_inputs: Some(inputs),
                row_errors: errors,
                ..DashboardRender::from_query(&query)
            };
            return show_dashboard(&state, &query, render, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.api.update(id, &data).await {
        Ok(()) => {
            edit.finish();
            Redirect::to(&dashboard_location(
                edit,
                Some(Notice::Updated),
                query.name_filter(),
            ))
            .into_response()
        }
        Err(e) => {
            warn!(id, status = %e.status(), error = %e, "participation_update_failed");
            let render = DashboardRender {
                edit,
                row_inputs: Some(inputs),
                error_message: Some(e.user_message()),
                ..DashboardRender::from_query(&query)
            };
            show_dashboard(&state, &query, render, StatusCode::BAD_GATEWAY).await
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub confirm: Option<String>, // yes|no
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DashboardQuery>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if form.confirm.as_deref().map(str::trim) != Some("yes") {
        info!(id, "participation_delete_declined");
        return Redirect::to(&dashboard_location(
            EditState::default(),
            None,
            query.name_filter(),
        ))
        .into_response();
    }

    match state.api.delete(id).await {
        Ok(()) => Redirect::to(&dashboard_location(
            EditState::default(),
            Some(Notice::Deleted),
            query.name_filter(),
        ))
        .into_response(),
        Err(e) => {
            warn!(id, status = %e.status(), error = %e, "participation_delete_failed");
            let render = DashboardRender {
                error_message: Some(e.user_message()),
                ..DashboardRender::from_query(&query)
            };
            show_dashboard(&state, &query, render, StatusCode::BAD_GATEWAY).await
        }
    }
}
