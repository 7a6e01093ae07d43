//! Shared vault state behind the web handlers
//!
//! The view state sits behind a read/write lock that is held only while it is
//! read or changed, never across a store request, so toggling and searching
//! answer at once even when the store is slow. Store round trips queue on a
//! separate mutex instead: a mutation and the reload that follows it finish
//! before the next round trip starts.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::controller::{ActionStatus, Mutation, VaultController};
use crate::models::{AccountDraft, AccountUpdate};
use crate::store::Store;

#[derive(Clone)]
pub struct VaultSession {
    view: Arc<RwLock<VaultController>>,
    store: Store,
    round_trips: Arc<Mutex<()>>,
}

impl VaultSession {
    pub fn new(controller: VaultController, store: Store) -> Self {
        Self {
            view: Arc::new(RwLock::new(controller)),
            store,
            round_trips: Arc::new(Mutex::new(())),
        }
    }

    pub async fn view(&self) -> RwLockReadGuard<'_, VaultController> {
        self.view.read().await
    }

    /// Exclusive access for local actions; do not hold across store calls
    pub async fn view_mut(&self) -> RwLockWriteGuard<'_, VaultController> {
        self.view.write().await
    }

    /// Re-fetch the full listing
    pub async fn reload(&self) -> ActionStatus {
        let _turn = self.round_trips.lock().await;
        self.fetch_listing().await
    }

    pub async fn submit_add(&self, draft: AccountDraft) -> ActionStatus {
        self.mutate(|view| view.prepare_create(draft)).await
    }

    pub async fn submit_edit(&self, update: AccountUpdate) -> ActionStatus {
        self.mutate(|view| view.prepare_update(update)).await
    }

    /// Delete the account whose confirmation dialog is open
    pub async fn confirm_delete(&self) -> ActionStatus {
        self.mutate(VaultController::prepare_delete).await
    }

    async fn mutate<F>(&self, prepare: F) -> ActionStatus
    where
        F: FnOnce(&mut VaultController) -> Result<Mutation, ActionStatus> + Send,
    {
        let _turn = self.round_trips.lock().await;

        let prepared = prepare(&mut *self.view.write().await);
        let mutation = match prepared {
            Ok(mutation) => mutation,
            Err(status) => return status,
        };

        let result = mutation.send(&self.store).await;
        let status = self.view.write().await.finish_mutation(mutation, result);
        if status == ActionStatus::Completed {
            self.fetch_listing().await;
        }
        status
    }

    async fn fetch_listing(&self) -> ActionStatus {
        let listing = self.store.list().await;
        self.view.write().await.apply_listing(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Dialog, DialogKind, PasswordVisibility};
    use crate::store::Operation;
    use crate::testing::{MemoryTransport, RecordingLogger};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn session(listing: Value) -> (VaultSession, Arc<MemoryTransport>, Arc<RecordingLogger>) {
        let transport = Arc::new(MemoryTransport::with_listing(listing));
        let logger = Arc::new(RecordingLogger::default());
        let controller = VaultController::new().with_logger(logger.clone());
        let session = VaultSession::new(controller, Store::new(transport.clone()));
        (session, transport, logger)
    }

    fn three_sites() -> Value {
        json!({
            "1": {"name": "Bank", "url": "bank.com", "password": "p@ss"},
            "2": {"name": "Mail", "url": "mail.example.com", "password": "m41l"},
            "3": {"name": "Forum", "url": "EXAMPLE.org", "password": "f0rum"}
        })
    }

    async fn until_sent(transport: &MemoryTransport, operation: Operation) {
        while !transport.operations().contains(&operation) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_reload_mirrors_listing() {
        let (session, transport, _) = session(three_sites());

        assert_eq!(session.reload().await, ActionStatus::Completed);

        let view = session.view().await;
        let ids: Vec<&str> = view.rows().iter().map(|r| r.account.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(transport.operations(), vec![Operation::List]);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_rows() {
        let (session, transport, logger) = session(three_sites());
        session.reload().await;

        transport.fail(Operation::List);
        assert_eq!(session.reload().await, ActionStatus::Failed);
        assert_eq!(session.view().await.rows().len(), 3);
        assert!(session.view().await.load_notice().is_some());
        assert_eq!(logger.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_add_then_reload() {
        let (session, transport, _) = session(json!({}));
        session.reload().await;
        session.view_mut().await.open_add();
        transport.clear_calls();

        let status = session.submit_add(AccountDraft::new("X", "x.com", "pw")).await;

        assert_eq!(status, ActionStatus::Completed);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation, Operation::Create);
        assert_eq!(calls[0].body, Some(json!({"name": "X", "url": "x.com", "password": "pw"})));
        assert_eq!(calls[1].operation, Operation::List);

        let view = session.view().await;
        assert_eq!(view.dialog(), &Dialog::Closed);
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].account.name, "X");
    }

    #[tokio::test]
    async fn test_failed_add_sends_no_reload() {
        let (session, transport, _) = session(three_sites());
        session.reload().await;
        session.view_mut().await.open_add();
        transport.fail(Operation::Create);
        transport.clear_calls();

        let draft = AccountDraft::new("X", "x.com", "pw");
        assert_eq!(session.submit_add(draft.clone()).await, ActionStatus::Failed);

        assert_eq!(transport.operations(), vec![Operation::Create]);
        assert_eq!(session.view().await.dialog(), &Dialog::Add(draft));
    }

    #[tokio::test]
    async fn test_incomplete_form_sends_nothing() {
        let (session, transport, _) = session(json!({}));
        session.view_mut().await.open_add();

        let status = session.submit_add(AccountDraft::new("", "x.com", "pw")).await;

        assert_eq!(status, ActionStatus::Rejected);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edit_then_reload() {
        let (session, transport, _) = session(three_sites());
        session.reload().await;
        session.view_mut().await.begin_edit("1");
        transport.clear_calls();

        let update = AccountUpdate {
            id: "1".to_string(),
            name: "Bank".to_string(),
            url: "bank.com".to_string(),
            password: "n3w".to_string(),
        };
        assert_eq!(session.submit_edit(update).await, ActionStatus::Completed);

        assert_eq!(transport.operations(), vec![Operation::Update, Operation::List]);
        let view = session.view().await;
        assert_eq!(view.dialog(), &Dialog::Closed);
        assert_eq!(view.row("1").unwrap().account.password, "n3w");
    }

    #[tokio::test]
    async fn test_confirmed_delete_then_reload() {
        let (session, transport, _) = session(json!({
            "7": {"name": "Old", "url": "old.net", "password": "x"}
        }));
        session.reload().await;
        session.view_mut().await.request_delete("7");
        transport.clear_calls();

        assert_eq!(session.confirm_delete().await, ActionStatus::Completed);

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation, Operation::Delete);
        assert_eq!(calls[0].body, Some(json!({"id": "7"})));
        assert_eq!(calls[1].operation, Operation::List);
        assert!(session.view().await.rows().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let (session, transport, _) = session(three_sites());
        session.reload().await;
        session.view_mut().await.request_delete("3");
        session.view_mut().await.close_dialog(DialogKind::Delete);
        transport.clear_calls();

        assert_eq!(session.confirm_delete().await, ActionStatus::Rejected);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_local_actions_do_not_wait_for_the_store() {
        let (session, transport, _) = session(three_sites());
        session.reload().await;
        session.view_mut().await.request_delete("3");
        transport.hold(Operation::Delete);

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.confirm_delete().await }
        });
        until_sent(&transport, Operation::Delete).await;

        let visibility = tokio::time::timeout(Duration::from_secs(2), async {
            let mut view = session.view_mut().await;
            view.filter("bank");
            view.toggle_password("1").map(|row| row.visibility)
        })
        .await
        .expect("local actions waited on the store");
        assert_eq!(visibility, Some(PasswordVisibility::Plain));
        assert_eq!(session.view().await.dialog(), &Dialog::Delete { id: "3".to_string() });

        transport.release();
        assert_eq!(pending.await.unwrap(), ActionStatus::Completed);

        let view = session.view().await;
        assert_eq!(view.rows().len(), 2);
        let shown: Vec<&str> = view
            .rows()
            .iter()
            .filter(|row| row.shown)
            .map(|row| row.account.id.as_str())
            .collect();
        assert_eq!(shown, vec!["1"]);
        assert_eq!(view.dialog(), &Dialog::Closed);
    }

    #[tokio::test]
    async fn test_round_trips_take_turns() {
        let (session, transport, _) = session(three_sites());
        session.reload().await;
        session.view_mut().await.request_delete("3");
        transport.hold(Operation::Delete);
        transport.clear_calls();

        let deletion = tokio::spawn({
            let session = session.clone();
            async move { session.confirm_delete().await }
        });
        until_sent(&transport, Operation::Delete).await;

        let reload = tokio::spawn({
            let session = session.clone();
            async move { session.reload().await }
        });
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.operations(), vec![Operation::Delete]);

        transport.release();
        assert_eq!(deletion.await.unwrap(), ActionStatus::Completed);
        assert_eq!(reload.await.unwrap(), ActionStatus::Completed);
        assert_eq!(
            transport.operations(),
            vec![Operation::Delete, Operation::List, Operation::List]
        );
    }
}
