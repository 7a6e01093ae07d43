//! Account records and the request bodies built from them

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::store::Operation;

/// One stored credential, as listed by the store
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub url: String,
    pub password: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Add form contents; serialized as the create request body
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub password: String,
}

impl AccountDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            password: password.into(),
        }
    }

    /// Every field is required and must be non-empty
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.url.is_empty() && !self.password.is_empty()
    }

    fn into_account(self, id: String) -> Account {
        Account {
            id,
            name: self.name,
            url: self.url,
            password: self.password,
        }
    }
}

impl std::fmt::Debug for AccountDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDraft")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Edit form contents; serialized as the update request body
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub password: String,
}

impl AccountUpdate {
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty() && !self.url.is_empty() && !self.password.is_empty()
    }
}

impl From<&Account> for AccountUpdate {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            url: account.url.clone(),
            password: account.password.clone(),
        }
    }
}

impl std::fmt::Debug for AccountUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountUpdate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Delete request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub id: String,
}

/// Decode a listing response: a JSON object mapping id to `{name, url, password}`.
///
/// Entries come back in the order the store sent them.
pub fn parse_account_list(value: Value) -> Result<Vec<Account>, CoreError> {
    let Value::Object(entries) = value else {
        return Err(CoreError::request_failed(
            Operation::List,
            "listing response is not a JSON object",
        ));
    };

    entries
        .into_iter()
        .map(|(id, record)| {
            serde_json::from_value::<AccountRecord>(record)
                .map(|record| record.into_draft().into_account(id.clone()))
                .map_err(|e| {
                    CoreError::request_failed(Operation::List, format!("record {}: {}", id, e))
                })
        })
        .collect()
}

// Unlike the form types, listed records must carry every field.
#[derive(Deserialize)]
struct AccountRecord {
    name: String,
    url: String,
    password: String,
}

impl AccountRecord {
    fn into_draft(self) -> AccountDraft {
        AccountDraft::new(self.name, self.url, self.password)
    }
}
