//! External collaborators: user registry, meter data, certificate logic.
//!
//! The table never talks to a ledger directly. Everything it needs beyond the
//! asset/certificate lists goes through these traits, held in
//! [`OriginServices`] so commands can pick them up from their snapshot.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use origin_states::{State, state_assign_impl};
use thiserror::Error;

use crate::model::{Address, AssetId, SmartMeterRead};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("User {0} is not registered")]
    UnknownUser(Address),

    #[error("Asset {0} is not registered")]
    UnknownAsset(AssetId),

    #[error("Read index {requested} is beyond the {available} smart meter reads of asset {asset}")]
    ReadOutOfRange {
        asset: AssetId,
        requested: usize,
        available: usize,
    },

    #[error("Lookup failed: {0}")]
    Unavailable(String),
}

/// Resolves account metadata.
#[async_trait]
pub trait UserDirectory: Send + Sync + Debug {
    async fn organization(&self, address: &Address) -> Result<String, LookupError>;
}

/// Smart meter data of producing assets.
#[async_trait]
pub trait MeterReadSource: Send + Sync + Debug {
    async fn smart_meter_reads(&self, asset: AssetId) -> Result<Vec<SmartMeterRead>, LookupError>;
}

/// Certificate issuance bookkeeping.
#[async_trait]
pub trait CertificateLogic: Send + Sync + Debug {
    /// Number of smart meter reads of `asset` already covered by a certificate request.
    async fn requested_reads_len(&self, asset: AssetId) -> Result<usize, LookupError>;

    /// Request certificates for every read up to (excluding) `up_to_read`, on behalf of
    /// `requester`.
    async fn request_certificates(
        &self,
        asset: AssetId,
        up_to_read: usize,
        requester: &Address,
    ) -> Result<(), LookupError>;
}

/// Service handles available to commands.
#[derive(Debug, Clone)]
pub struct OriginServices {
    pub directory: Arc<dyn UserDirectory>,
    pub meter_reads: Arc<dyn MeterReadSource>,
    pub certificate_logic: Arc<dyn CertificateLogic>,
}

impl OriginServices {
    /// All three services backed by one implementation.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserDirectory + MeterReadSource + CertificateLogic + 'static,
    {
        Self {
            directory: backend.clone(),
            meter_reads: backend.clone(),
            certificate_logic: backend,
        }
    }
}

impl State for OriginServices {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}
