//! Vault view controller
//!
//! Holds the rows of the last successful listing, the one dialog that may be
//! open, and the search text. The controller never talks to the store itself:
//! a submitted form becomes a [`Mutation`], the caller sends it, and the
//! outcome comes back through [`VaultController::finish_mutation`]. Accepted
//! mutations are followed by a full reload; nothing is patched locally.

use serde_json::json;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::{Account, AccountDraft, AccountUpdate};
use crate::store::Store;

/// Display state of one password field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordVisibility {
    #[default]
    Masked,
    Plain,
}

impl PasswordVisibility {
    pub fn toggled(self) -> Self {
        match self {
            PasswordVisibility::Masked => PasswordVisibility::Plain,
            PasswordVisibility::Plain => PasswordVisibility::Masked,
        }
    }

    /// Label of the toggle control
    pub fn label(&self) -> &'static str {
        match self {
            PasswordVisibility::Masked => "View",
            PasswordVisibility::Plain => "Hide",
        }
    }

    /// `type` attribute of the password input
    pub fn input_type(&self) -> &'static str {
        match self {
            PasswordVisibility::Masked => "password",
            PasswordVisibility::Plain => "text",
        }
    }
}

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub account: Account,
    pub visibility: PasswordVisibility,
    /// False when the current search text does not match the URL
    pub shown: bool,
}

impl AccountRow {
    fn new(account: Account) -> Self {
        Self {
            account,
            visibility: PasswordVisibility::Masked,
            shown: true,
        }
    }
}

/// The three dialogs of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Add,
    Edit,
    Delete,
}

impl DialogKind {
    /// DOM id of the dialog overlay
    pub fn dom_id(&self) -> &'static str {
        match self {
            DialogKind::Add => "addModal",
            DialogKind::Edit => "editModal",
            DialogKind::Delete => "deleteModal",
        }
    }
}

impl std::str::FromStr for DialogKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(DialogKind::Add),
            "edit" => Ok(DialogKind::Edit),
            "delete" => Ok(DialogKind::Delete),
            _ => Err(format!("Invalid dialog: {}", s)),
        }
    }
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogKind::Add => write!(f, "add"),
            DialogKind::Edit => write!(f, "edit"),
            DialogKind::Delete => write!(f, "delete"),
        }
    }
}

/// Which dialog is open, with the values it shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Closed,
    Add(AccountDraft),
    Edit(AccountUpdate),
    Delete { id: String },
}

impl Dialog {
    pub fn kind(&self) -> Option<DialogKind> {
        match self {
            Dialog::Closed => None,
            Dialog::Add(_) => Some(DialogKind::Add),
            Dialog::Edit(_) => Some(DialogKind::Edit),
            Dialog::Delete { .. } => Some(DialogKind::Delete),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Dialog::Closed)
    }
}

/// Outcome of a user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Completed,
    /// The store request failed; the error has been reported
    Failed,
    /// Refused locally, no request was sent
    Rejected,
}

const INCOMPLETE_FORM: &str = "Name, URL and password are all required.";

/// A validated change waiting to be sent to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(AccountDraft),
    Update(AccountUpdate),
    Delete { id: String },
}

impl Mutation {
    pub async fn send(&self, store: &Store) -> CoreResult<()> {
        match self {
            Mutation::Create(draft) => store.create(draft).await,
            Mutation::Update(update) => store.update(update).await,
            Mutation::Delete { id } => store.delete(id).await,
        }
    }

    /// Dialog the mutation was submitted from
    pub fn kind(&self) -> DialogKind {
        match self {
            Mutation::Create(_) => DialogKind::Add,
            Mutation::Update(_) => DialogKind::Edit,
            Mutation::Delete { .. } => DialogKind::Delete,
        }
    }

    fn into_dialog(self) -> Dialog {
        match self {
            Mutation::Create(draft) => Dialog::Add(draft),
            Mutation::Update(update) => Dialog::Edit(update),
            Mutation::Delete { id } => Dialog::Delete { id },
        }
    }

    fn context(&self) -> ErrorContext {
        match self {
            Mutation::Create(draft) => {
                ErrorContext::new("create account").with_data("url", json!(draft.url))
            }
            Mutation::Update(update) => {
                ErrorContext::new("update account").with_data("id", json!(update.id))
            }
            Mutation::Delete { id } => ErrorContext::new("delete account").with_data("id", json!(id)),
        }
    }
}

pub struct VaultController {
    logger: Arc<dyn ErrorLogger>,
    rows: Vec<AccountRow>,
    search: String,
    dialog: Dialog,
    /// Shown inside the open dialog after a failed or rejected action
    notice: Option<String>,
    /// Shown above the table after a failed load
    load_notice: Option<String>,
}

impl Default for VaultController {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultController {
    pub fn new() -> Self {
        Self {
            logger: Arc::new(DefaultErrorLogger),
            rows: Vec::new(),
            search: String::new(),
            dialog: Dialog::Closed,
            notice: None,
            load_notice: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn rows(&self) -> &[AccountRow] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&AccountRow> {
        self.rows.iter().find(|row| row.account.id == id)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn load_notice(&self) -> Option<&str> {
        self.load_notice.as_deref()
    }

    // ==================== Store round trips ====================

    /// Replace every row with a fresh listing.
    ///
    /// A failed listing leaves the previous rows as they are.
    pub fn apply_listing(&mut self, listing: CoreResult<Vec<Account>>) -> ActionStatus {
        match listing {
            Ok(accounts) => {
                log::debug!("loaded {} accounts", accounts.len());
                self.rows = accounts.into_iter().map(AccountRow::new).collect();
                self.apply_filter();
                self.load_notice = None;
                ActionStatus::Completed
            }
            Err(error) => {
                self.logger.log_error(&error, &ErrorContext::new("load accounts"));
                self.load_notice = Some(error.user_message());
                ActionStatus::Failed
            }
        }
    }

    pub fn prepare_create(&mut self, draft: AccountDraft) -> Result<Mutation, ActionStatus> {
        if !draft.is_complete() {
            return Err(self.reject(Dialog::Add(draft)));
        }
        Ok(Mutation::Create(draft))
    }

    pub fn prepare_update(&mut self, update: AccountUpdate) -> Result<Mutation, ActionStatus> {
        if !update.is_complete() {
            return Err(self.reject(Dialog::Edit(update)));
        }
        Ok(Mutation::Update(update))
    }

    /// Deletion of the account whose confirmation dialog is open
    pub fn prepare_delete(&mut self) -> Result<Mutation, ActionStatus> {
        match &self.dialog {
            Dialog::Delete { id } => Ok(Mutation::Delete { id: id.clone() }),
            _ => {
                self.logger.log_warning(
                    "delete confirmed with no deletion pending",
                    &ErrorContext::new("delete account"),
                );
                Err(ActionStatus::Rejected)
            }
        }
    }

    /// Apply the store's answer to a mutation.
    ///
    /// The dialog may have changed while the request was outstanding. An
    /// accepted mutation closes its own dialog only; a failed one reopens its
    /// dialog with the submitted values unless another dialog has been opened
    /// since. The caller reloads after [`ActionStatus::Completed`].
    pub fn finish_mutation(&mut self, mutation: Mutation, result: CoreResult<()>) -> ActionStatus {
        let kind = mutation.kind();
        let context = mutation.context();
        match result {
            Ok(()) => {
                log::info!("{} accepted by the store", context.operation);
                if self.dialog.kind() == Some(kind) {
                    self.dialog = Dialog::Closed;
                    self.notice = None;
                }
                ActionStatus::Completed
            }
            Err(error) => {
                if self.dialog.is_open() && self.dialog.kind() != Some(kind) {
                    self.logger.log_error(&error, &context);
                } else {
                    self.report(&error, &context);
                    self.dialog = mutation.into_dialog();
                }
                ActionStatus::Failed
            }
        }
    }

    fn report(&mut self, error: &CoreError, context: &ErrorContext) {
        self.logger.log_error(error, context);
        self.notice = Some(error.user_message());
    }

    fn reject(&mut self, dialog: Dialog) -> ActionStatus {
        self.dialog = dialog;
        self.notice = Some(INCOMPLETE_FORM.to_string());
        ActionStatus::Rejected
    }

    // ==================== Dialogs ====================

    pub fn open_add(&mut self) {
        self.open(Dialog::Add(AccountDraft::default()));
    }

    /// Open the edit dialog pre-filled with the row's current values
    pub fn begin_edit(&mut self, id: &str) -> ActionStatus {
        match self.row(id) {
            Some(row) => {
                let update = AccountUpdate::from(&row.account);
                self.open(Dialog::Edit(update));
                ActionStatus::Completed
            }
            None => self.unknown_row(id, "edit account"),
        }
    }

    /// Ask for confirmation before deleting
    pub fn request_delete(&mut self, id: &str) -> ActionStatus {
        if self.row(id).is_none() {
            return self.unknown_row(id, "delete account");
        }
        self.open(Dialog::Delete { id: id.to_string() });
        ActionStatus::Completed
    }

    /// Close control or click outside the dialog; other dialogs are left alone
    pub fn close_dialog(&mut self, kind: DialogKind) -> bool {
        if self.dialog.kind() != Some(kind) {
            return false;
        }
        self.dialog = Dialog::Closed;
        self.notice = None;
        true
    }

    // Opening any dialog replaces the one already open.
    fn open(&mut self, dialog: Dialog) {
        self.dialog = dialog;
        self.notice = None;
    }

    fn unknown_row(&self, id: &str, operation: &str) -> ActionStatus {
        self.logger.log_warning(
            "no such row",
            &ErrorContext::new(operation).with_data("id", json!(id)),
        );
        ActionStatus::Rejected
    }

    // ==================== Local actions ====================

    /// Flip one row between masked and plaintext
    pub fn toggle_password(&mut self, id: &str) -> Option<&AccountRow> {
        let Some(index) = self.rows.iter().position(|row| row.account.id == id) else {
            self.unknown_row(id, "toggle password");
            return None;
        };
        let row = &mut self.rows[index];
        row.visibility = row.visibility.toggled();
        Some(&self.rows[index])
    }

    /// Show only rows whose URL contains `term`, ignoring case
    pub fn filter(&mut self, term: &str) {
        self.search = term.to_string();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        for row in &mut self.rows {
            row.shown = vaultweb_utils::contains_ignore_case(&row.account.url, &self.search);
        }
    }
}

// ==================== Tests ====================
