//! Producing asset table of the Origin dashboard, without a UI toolkit.
//!
//! The table, its paginated loader, row actions and the I-REC request modal
//! all live as states and commands in an [`origin_states::StateCtx`]; the
//! embedding view calls the functions in [`producing_assets`] on user input
//! and renders whatever the states hold after `sync_updates`.

mod config;
mod ledger;
mod model;
mod notification;
mod services;

pub mod pagination;
pub mod producing_assets;

pub use config::{BusinessConfig, ConfigError};
pub use ledger::{InMemoryLedger, LedgerFixture, MeterLog};
pub use model::{
    Address, AssetId, Certificate, OffChainProperties, ProducingAsset, Role, SmartMeterRead, User,
};
pub use notification::{Notification, NotificationKind, Notifications};
pub use pagination::{
    DEFAULT_PAGE_SIZE, LoadError, PageData, PageFetcher, PageFilter, PageParams, PageStatus,
    PaginatedLoader,
};
pub use services::{CertificateLogic, LookupError, MeterReadSource, OriginServices, UserDirectory};
