//! Vault HTMX endpoints
//!
//! Only the store-backed endpoints wait on the store; the view lock is never
//! held while they do, so local actions answer immediately.
//!
//! Endpoints:
//! - page_vault: Reload from the store and render the full page
//! - htmx_dialog_add / htmx_dialog_edit / htmx_dialog_delete: Open a dialog (vault region)
//! - htmx_dialog_close: Close control or outside click (vault region)
//! - htmx_account_create / htmx_account_update / htmx_delete_confirm: Store mutations (vault region)
//! - htmx_password_toggle: Flip one password field (table row)
//! - htmx_search: Filter rows by URL (table body)

use axum::extract::{Form, Path, State};
use axum::response::Html;
use serde::Deserialize;
use vaultweb_core::{AccountDraft, AccountUpdate, ActionStatus, DialogKind};

use super::page::{render_row, render_table_body, render_vault_page, render_vault_region};
use crate::{ApiError, AppState};

/// Search bar contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search: String,
}

pub async fn page_vault(State(state): State<AppState>) -> Html<String> {
    state.vault.reload().await;
    let vault = state.vault.view().await;
    Html(render_vault_page(&vault))
}

pub async fn htmx_dialog_add(State(state): State<AppState>) -> Html<String> {
    let mut vault = state.vault.view_mut().await;
    vault.open_add();
    Html(render_vault_region(&vault))
}

pub async fn htmx_dialog_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Html<String> {
    let mut vault = state.vault.view_mut().await;
    vault.begin_edit(&id);
    Html(render_vault_region(&vault))
}

pub async fn htmx_dialog_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Html<String> {
    let mut vault = state.vault.view_mut().await;
    vault.request_delete(&id);
    Html(render_vault_region(&vault))
}

pub async fn htmx_dialog_close(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Html<String>, ApiError> {
    let kind: DialogKind = kind
        .parse()
        .map_err(|message| ApiError::BadRequest { message })?;

    let mut vault = state.vault.view_mut().await;
    vault.close_dialog(kind);
    Ok(Html(render_vault_region(&vault)))
}

pub async fn htmx_account_create(
    State(state): State<AppState>,
    Form(draft): Form<AccountDraft>,
) -> Html<String> {
    let status = state.vault.submit_add(draft).await;
    log::debug!("create account: {:?}", status);
    let vault = state.vault.view().await;
    Html(render_vault_region(&vault))
}

pub async fn htmx_account_update(
    State(state): State<AppState>,
    Form(update): Form<AccountUpdate>,
) -> Html<String> {
    let status = state.vault.submit_edit(update).await;
    log::debug!("update account: {:?}", status);
    let vault = state.vault.view().await;
    Html(render_vault_region(&vault))
}

pub async fn htmx_delete_confirm(State(state): State<AppState>) -> Html<String> {
    if state.vault.confirm_delete().await == ActionStatus::Rejected {
        log::debug!("delete confirmed without an open confirmation dialog");
    }
    let vault = state.vault.view().await;
    Html(render_vault_region(&vault))
}

pub async fn htmx_password_toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let mut vault = state.vault.view_mut().await;
    let row = vault
        .toggle_password(&id)
        .ok_or_else(|| ApiError::NotFound { resource: format!("account {}", id) })?;
    Ok(Html(render_row(row)))
}

pub async fn htmx_search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Html<String> {
    let mut vault = state.vault.view_mut().await;
    vault.filter(&form.search);
    Html(render_table_body(&vault))
}
