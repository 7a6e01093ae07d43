//! Vault routes - account table and its dialogs
//!
//! Features:
//! - Account table reloaded from the store on page load and after every change
//! - Add, edit and delete dialogs (one open at a time)
//! - Per-row password visibility toggle
//! - Case-insensitive URL search
//!
//! Structure:
//! - api.rs: HTMX endpoints
//! - page.rs: Full page and fragment rendering

pub mod api;
pub mod page;

pub use api::{
    htmx_account_create,
    htmx_account_update,
    htmx_delete_confirm,
    htmx_dialog_add,
    htmx_dialog_close,
    htmx_dialog_delete,
    htmx_dialog_edit,
    htmx_password_toggle,
    htmx_search,
    page_vault,
    SearchForm,
};
pub use page::{
    render_row,
    render_table_body,
    render_vault_page,
    render_vault_region,
};
