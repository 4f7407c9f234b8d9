//! Ledger entities as the table sees them.
//!
//! These mirror the registry records the dashboard reads: producing assets,
//! certificates, users with roles, and smart meter reads. All are plain data;
//! the services that resolve related records live in [`crate::services`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account address. Stored lowercased, so equality is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Registry roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    UserAdmin,
    AssetAdmin,
    AgreementAdmin,
    AssetManager,
    Trader,
    Matcher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserAdmin => "User Admin",
            Self::AssetAdmin => "Asset Admin",
            Self::AgreementAdmin => "Agreement Admin",
            Self::AssetManager => "Asset Manager",
            Self::Trader => "Trader",
            Self::Matcher => "Matcher",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Address,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(id: impl Into<Address>, organization: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            organization: organization.into(),
            roles,
        }
    }

    pub fn is_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Off-chain facility description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffChainProperties {
    pub facility_name: String,
    pub region: String,
    pub country: String,
    pub capacity_wh: u64,
    #[serde(default = "default_asset_type")]
    pub asset_type: String,
}

fn default_asset_type() -> String {
    "Battery".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducingAsset {
    pub id: AssetId,
    pub owner: Address,
    pub off_chain_properties: OffChainProperties,
    #[serde(default)]
    pub last_smart_meter_read_wh: u64,
}

impl ProducingAsset {
    pub fn is_owned_by(&self, address: &Address) -> bool {
        &self.owner == address
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: u64,
    pub asset_id: AssetId,
    pub owner: Address,
    #[serde(default)]
    pub power_wh: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartMeterRead {
    pub energy_wh: u64,
    pub timestamp: DateTime<Utc>,
}
