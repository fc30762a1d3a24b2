//! Basic types for the fund domain

use serde::{Deserialize, Serialize};

/// Object type constants used as the middle segment of a PHID
pub mod phid_type {
    pub const INITIATIVE: &str = "FITV";
    pub const BACKER: &str = "FBAK";
    pub const MERCHANT: &str = "CMRC";
    pub const USER: &str = "USER";
    pub const TRANSACTION: &str = "XACT";
}

/// Object identifier, e.g. `PHID-FITV-abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phid(String);

impl Phid {
    pub fn new(value: impl Into<String>) -> Self {
        Phid(value.into())
    }

    /// Generate a fresh identifier for an object of the given type
    pub fn generate(type_const: &str) -> Self {
        Phid(fundweb_utils::generate_phid(type_const))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The type segment (`FITV` in `PHID-FITV-abc`), if well formed
    pub fn phid_type(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("PHID"), Some(ty), Some(_)) => Some(ty),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Phid {
    fn from(s: &str) -> Self {
        Phid(s.to_string())
    }
}

/// Initiative status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiativeStatus {
    /// Accepting backers
    Open,
    /// No longer accepting backers
    Closed,
}

impl Default for InitiativeStatus {
    fn default() -> Self {
        InitiativeStatus::Open
    }
}

impl std::str::FromStr for InitiativeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(InitiativeStatus::Open),
            "closed" => Ok(InitiativeStatus::Closed),
            _ => Err(format!("Invalid initiative status: {}", s)),
        }
    }
}

impl std::fmt::Display for InitiativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitiativeStatus::Open => write!(f, "open"),
            InitiativeStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A permission a viewer may hold over an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Edit,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::View => write!(f, "view"),
            Capability::Edit => write!(f, "edit"),
        }
    }
}

/// Every mutation kind known to the editors.
///
/// The `fund:*` kinds belong to initiatives; the `core:*` kinds are shared by
/// every editable object and handled by the base editor unless an editor
/// overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "fund:name")]
    Name,
    #[serde(rename = "fund:description")]
    Description,
    #[serde(rename = "fund:risks")]
    Risks,
    #[serde(rename = "fund:status")]
    Status,
    #[serde(rename = "fund:backer")]
    Backer,
    #[serde(rename = "fund:merchant")]
    Merchant,
    #[serde(rename = "core:view-policy")]
    ViewPolicy,
    #[serde(rename = "core:edit-policy")]
    EditPolicy,
    #[serde(rename = "core:subscribers")]
    Subscribers,
    #[serde(rename = "core:edge")]
    Edge,
}

impl TransactionType {
    /// Kinds every editor accepts without declaring them
    pub const BASE_TYPES: [TransactionType; 2] =
        [TransactionType::Subscribers, TransactionType::Edge];

    /// Whether the kind belongs to the shared base editor
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            TransactionType::ViewPolicy
                | TransactionType::EditPolicy
                | TransactionType::Subscribers
                | TransactionType::Edge
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Name => "fund:name",
            TransactionType::Description => "fund:description",
            TransactionType::Risks => "fund:risks",
            TransactionType::Status => "fund:status",
            TransactionType::Backer => "fund:backer",
            TransactionType::Merchant => "fund:merchant",
            TransactionType::ViewPolicy => "core:view-policy",
            TransactionType::EditPolicy => "core:edit-policy",
            TransactionType::Subscribers => "core:subscribers",
            TransactionType::Edge => "core:edge",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fund:name" => Ok(TransactionType::Name),
            "fund:description" => Ok(TransactionType::Description),
            "fund:risks" => Ok(TransactionType::Risks),
            "fund:status" => Ok(TransactionType::Status),
            "fund:backer" => Ok(TransactionType::Backer),
            "fund:merchant" => Ok(TransactionType::Merchant),
            "core:view-policy" => Ok(TransactionType::ViewPolicy),
            "core:edit-policy" => Ok(TransactionType::EditPolicy),
            "core:subscribers" => Ok(TransactionType::Subscribers),
            "core:edge" => Ok(TransactionType::Edge),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The acting principal of an edit or query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
    pub phid: Phid,
    /// Omnipotent viewers pass every visibility and capability check
    #[serde(default)]
    pub omnipotent: bool,
}

impl Viewer {
    pub fn new(phid: Phid) -> Self {
        Self { phid, omnipotent: false }
    }

    /// The system viewer used for administrative work
    pub fn omnipotent() -> Self {
        Self {
            phid: Phid::new("PHID-USER-system"),
            omnipotent: true,
        }
    }
}
