use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;

use crate::api::render::{self, CategoryView};
use crate::api::response::{AppQuery, PageError};
use crate::auth::CurrentUser;
use crate::pagination::{build_navigation_bar, page_count, parse_page_number};
use crate::storage::models::Category;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub p: Option<String>,
}

pub async fn categories_index(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Html<String>, PageError> {
    let mut counts = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let count = state
            .db
            .count_category(category)
            .map_err(|e| PageError::internal("Failed to count category", e))?;
        counts.push((category, count));
    }

    Ok(Html(render::categories_page(&username, &counts)))
}

pub async fn category_listing(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Path(name): Path<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Response, PageError> {
    let category = name
        .parse::<Category>()
        .map_err(|_| PageError::not_found(format!("No category named '{name}'")))?;

    let render_message = |message: &str| {
        Html(render::category_page(&CategoryView {
            user: &username,
            category,
            files: &[],
            nav: &[],
            current_page: 0,
            message: Some(message),
        }))
        .into_response()
    };

    let Ok(current_page) = parse_page_number(params.p.as_deref()) else {
        return Ok(render_message("Invalid page number"));
    };

    let page_size = state.config.page_size;
    let offset = (current_page - 1).saturating_mul(page_size);
    let page = state
        .db
        .list_category(category, offset, page_size)
        .map_err(|e| PageError::internal("Failed to list category", e))?;

    if page.total == 0 {
        return Ok(render_message("No files yet"));
    }

    let pages_count = page_count(page.total, page_size);
    if current_page > pages_count {
        let message = format!("Page {current_page} does not exist");
        return Ok(render_message(message.as_str()));
    }

    let nav = build_navigation_bar(pages_count, current_page, category.as_str());
    let view = CategoryView {
        user: &username,
        category,
        files: &page.files,
        nav: &nav,
        current_page,
        message: None,
    };
    Ok(Html(render::category_page(&view)).into_response())
}
