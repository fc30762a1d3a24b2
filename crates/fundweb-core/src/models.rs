//! Core data models for fund initiatives

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::{Currency, CurrencyError};
use crate::types::{phid_type, InitiativeStatus, Phid, TransactionType, Viewer};

/// Payload carried by a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TransactionValue {
    /// No value, e.g. the old value of a backer transaction
    Null,
    Text(String),
    Phid(Phid),
    Status(InitiativeStatus),
    Policy(String),
    Phids(Vec<Phid>),
}

impl TransactionValue {
    pub fn text(value: impl Into<String>) -> Self {
        TransactionValue::Text(value.into())
    }

    pub fn phid(value: impl Into<String>) -> Self {
        TransactionValue::Phid(Phid::new(value))
    }

    pub fn policy(value: impl Into<String>) -> Self {
        TransactionValue::Policy(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TransactionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_phid(&self) -> Option<&Phid> {
        match self {
            TransactionValue::Phid(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<InitiativeStatus> {
        match self {
            TransactionValue::Status(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_policy(&self) -> Option<&str> {
        match self {
            TransactionValue::Policy(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Null` and for empty text, identifiers and lists
    pub fn is_blank(&self) -> bool {
        match self {
            TransactionValue::Null => true,
            TransactionValue::Text(s) | TransactionValue::Policy(s) => s.is_empty(),
            TransactionValue::Phid(p) => p.is_empty(),
            TransactionValue::Phids(list) => list.is_empty(),
            TransactionValue::Status(_) => false,
        }
    }

    /// Short name of the payload kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionValue::Null => "null",
            TransactionValue::Text(_) => "text",
            TransactionValue::Phid(_) => "phid",
            TransactionValue::Status(_) => "status",
            TransactionValue::Policy(_) => "policy",
            TransactionValue::Phids(_) => "phids",
        }
    }
}

impl From<Option<Phid>> for TransactionValue {
    fn from(value: Option<Phid>) -> Self {
        value.map(TransactionValue::Phid).unwrap_or(TransactionValue::Null)
    }
}

/// One proposed field mutation.
///
/// Transactions are never modified once built; the engine derives the
/// recorded copy (author, object, old and new value) through the consuming
/// `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: Phid,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_phid: Option<Phid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_phid: Option<Phid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_value: Option<TransactionValue>,
    new_value: TransactionValue,
    date_created: DateTime<Utc>,
}

impl Transaction {
    pub fn new(transaction_type: TransactionType, new_value: TransactionValue) -> Self {
        Self {
            id: Phid::generate(phid_type::TRANSACTION),
            transaction_type,
            author_phid: None,
            object_phid: None,
            old_value: None,
            new_value,
            date_created: Utc::now(),
        }
    }

    pub fn id(&self) -> &Phid {
        &self.id
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn author_phid(&self) -> Option<&Phid> {
        self.author_phid.as_ref()
    }

    pub fn object_phid(&self) -> Option<&Phid> {
        self.object_phid.as_ref()
    }

    /// Value captured before the edit; `None` until the engine fills it
    pub fn old_value(&self) -> Option<&TransactionValue> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> &TransactionValue {
        &self.new_value
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub(crate) fn with_context(self, author_phid: Phid, object_phid: Phid) -> Self {
        Self {
            author_phid: Some(author_phid),
            object_phid: Some(object_phid),
            ..self
        }
    }

    pub(crate) fn with_values(self, old_value: TransactionValue, new_value: TransactionValue) -> Self {
        Self {
            old_value: Some(old_value),
            new_value,
            ..self
        }
    }
}

/// A fundraising initiative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub phid: Phid,
    pub owner_phid: Phid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risks: String,
    #[serde(default)]
    pub status: InitiativeStatus,
    /// Merchant account receiving the funds
    #[serde(default)]
    pub merchant_phid: Option<Phid>,
    /// Total raised so far
    pub total: Currency,
    pub view_policy: String,
    pub edit_policy: String,
    #[serde(default)]
    pub subscriber_phids: Vec<Phid>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Policy that lets any logged-in user see an object
pub const POLICY_USERS: &str = "users";

impl Initiative {
    /// An empty, open initiative owned by `viewer`
    pub fn initialize_new(viewer: &Viewer, currency_code: &str) -> Self {
        let now = Utc::now();
        Self {
            phid: Phid::generate(phid_type::INITIATIVE),
            owner_phid: viewer.phid.clone(),
            name: String::new(),
            description: String::new(),
            risks: String::new(),
            status: InitiativeStatus::Open,
            merchant_phid: None,
            total: Currency::zero(currency_code),
            view_policy: POLICY_USERS.to_string(),
            edit_policy: viewer.phid.to_string(),
            subscriber_phids: vec![],
            date_created: now,
            date_modified: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == InitiativeStatus::Closed
    }
}

/// A pledge made to an initiative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backer {
    pub phid: Phid,
    pub initiative_phid: Phid,
    /// The user who pledged
    pub backer_phid: Phid,
    /// Amount as entered, e.g. `"50.00 USD"`
    pub amount: String,
}

impl Backer {
    pub fn amount_as_currency(&self, default_code: &str) -> Result<Currency, CurrencyError> {
        Currency::parse(&self.amount, default_code)
    }
}

/// Merchant account able to receive payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub phid: Phid,
    pub name: String,
}
