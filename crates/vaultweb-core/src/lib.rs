//! Account store client and vault view controller

pub mod controller;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use controller::{
    AccountRow, ActionStatus, Dialog, DialogKind, Mutation, PasswordVisibility, VaultController,
};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
pub use models::{Account, AccountDraft, AccountKey, AccountUpdate};
pub use session::VaultSession;
pub use store::{HttpTransport, Operation, Store, StoreRequest, Transport, TransportRef};
