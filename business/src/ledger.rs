//! In-memory ledger backing all [`crate::services`] traits.
//!
//! Loaded from a JSON fixture; used by the CLI and by tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::model::{Address, AssetId, Certificate, ProducingAsset, SmartMeterRead, User};
use crate::services::{
    CertificateLogic, LookupError, MeterReadSource, OriginServices, UserDirectory,
};

/// Meter history of one asset plus how many reads already have a certificate request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterLog {
    pub asset_id: AssetId,
    #[serde(default)]
    pub reads: Vec<SmartMeterRead>,
    #[serde(default)]
    pub requested: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFixture {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub producing_assets: Vec<ProducingAsset>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub meter_logs: Vec<MeterLog>,
}

#[derive(Debug)]
pub struct InMemoryLedger {
    users: BTreeMap<Address, User>,
    producing_assets: Arc<Vec<ProducingAsset>>,
    certificates: Arc<Vec<Certificate>>,
    meter_logs: Mutex<BTreeMap<AssetId, MeterLog>>,
}

impl InMemoryLedger {
    pub fn from_fixture(fixture: LedgerFixture) -> Self {
        let LedgerFixture {
            users,
            producing_assets,
            certificates,
            meter_logs,
        } = fixture;

        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
            producing_assets: Arc::new(producing_assets),
            certificates: Arc::new(certificates),
            meter_logs: Mutex::new(
                meter_logs
                    .into_iter()
                    .map(|entry| (entry.asset_id, entry))
                    .collect(),
            ),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: LedgerFixture = serde_json::from_str(json)?;
        log::debug!(
            "Loaded ledger fixture: {} users, {} assets, {} certificates",
            fixture.users.len(),
            fixture.producing_assets.len(),
            fixture.certificates.len()
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn producing_assets(&self) -> Arc<Vec<ProducingAsset>> {
        Arc::clone(&self.producing_assets)
    }

    pub fn certificates(&self) -> Arc<Vec<Certificate>> {
        Arc::clone(&self.certificates)
    }

    pub fn user(&self, address: &Address) -> Option<&User> {
        self.users.get(address)
    }

    pub async fn meter_log(&self, asset: AssetId) -> Option<MeterLog> {
        self.meter_logs.lock().await.get(&asset).cloned()
    }

    pub fn into_services(self: Arc<Self>) -> OriginServices {
        OriginServices::from_backend(self)
    }
}

#[async_trait]
impl UserDirectory for InMemoryLedger {
    async fn organization(&self, address: &Address) -> Result<String, LookupError> {
        self.users
            .get(address)
            .map(|user| user.organization.clone())
            .ok_or_else(|| LookupError::UnknownUser(address.clone()))
    }
}

#[async_trait]
impl MeterReadSource for InMemoryLedger {
    async fn smart_meter_reads(&self, asset: AssetId) -> Result<Vec<SmartMeterRead>, LookupError> {
        Ok(self
            .meter_logs
            .lock()
            .await
            .get(&asset)
            .map(|entry| entry.reads.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CertificateLogic for InMemoryLedger {
    async fn requested_reads_len(&self, asset: AssetId) -> Result<usize, LookupError> {
        Ok(self
            .meter_logs
            .lock()
            .await
            .get(&asset)
            .map(|entry| entry.requested)
            .unwrap_or_default())
    }

    async fn request_certificates(
        &self,
        asset: AssetId,
        up_to_read: usize,
        requester: &Address,
    ) -> Result<(), LookupError> {
        let mut logs = self.meter_logs.lock().await;
        let entry = logs
            .get_mut(&asset)
            .ok_or(LookupError::UnknownAsset(asset))?;

        if up_to_read > entry.reads.len() {
            return Err(LookupError::ReadOutOfRange {
                asset,
                requested: up_to_read,
                available: entry.reads.len(),
            });
        }

        log::info!(
            "{requester} requested certificates for reads {}..{up_to_read} of asset {asset}",
            entry.requested
        );
        entry.requested = entry.requested.max(up_to_read);
        Ok(())
    }
}
