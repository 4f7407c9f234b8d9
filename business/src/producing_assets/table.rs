use std::sync::Arc;

use async_trait::async_trait;
use origin_states::CommandSnapshot;

use super::enrich::{EnrichedProducingAsset, enrich_producing_assets};
use super::props::AssetTableProps;
use crate::model::{Address, AssetId, ProducingAsset};
use crate::pagination::{LoadError, PageData, PageFetcher, PageFilter, PageParams};
use crate::services::{OriginServices, UserDirectory};

/// Properties the table header can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterProperty {
    FacilityName,
    Region,
    Country,
    Owner,
}

impl FilterProperty {
    pub const ALL: [Self; 4] = [Self::FacilityName, Self::Region, Self::Country, Self::Owner];

    pub fn key(self) -> &'static str {
        match self {
            Self::FacilityName => "facilityName",
            Self::Region => "region",
            Self::Country => "country",
            Self::Owner => "owner",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.key() == key)
    }

    fn value_of(self, asset: &ProducingAsset) -> &str {
        let properties = &asset.off_chain_properties;
        match self {
            Self::FacilityName => &properties.facility_name,
            Self::Region => &properties.region,
            Self::Country => &properties.country,
            Self::Owner => asset.owner.as_str(),
        }
    }
}

/// Case-insensitive substring match on one asset property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub property: FilterProperty,
    needle: String,
}

impl ColumnFilter {
    pub fn new(property: FilterProperty, value: &str) -> Self {
        Self {
            property,
            needle: value.trim().to_lowercase(),
        }
    }

    pub fn parse(filter: &PageFilter) -> Result<Self, LoadError> {
        FilterProperty::from_key(filter.property.as_str())
            .map(|property| Self::new(property, &filter.value))
            .ok_or(LoadError::UnknownFilter(filter.property))
    }

    pub fn matches(&self, asset: &ProducingAsset) -> bool {
        self.property
            .value_of(asset)
            .to_lowercase()
            .contains(&self.needle)
    }
}

/// One projected table row.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRow {
    pub id: AssetId,
    pub owner: Address,
    pub organization_name: String,
    pub facility_name: String,
    pub region_country: String,
    pub asset_type: String,
    pub capacity_kw: f64,
    pub meter_read_kwh: f64,
    pub not_sold_certificates: usize,
}

impl From<EnrichedProducingAsset> for AssetRow {
    fn from(enriched: EnrichedProducingAsset) -> Self {
        let EnrichedProducingAsset {
            producing_asset,
            organization_name,
            not_sold_certificates,
        } = enriched;
        let properties = producing_asset.off_chain_properties;

        Self {
            id: producing_asset.id,
            owner: producing_asset.owner,
            organization_name,
            region_country: format!("{}, {}", properties.region, properties.country),
            facility_name: properties.facility_name,
            asset_type: properties.asset_type,
            capacity_kw: properties.capacity_wh as f64 / 1000.0,
            meter_read_kwh: producing_asset.last_smart_meter_read_wh as f64 / 1000.0,
            not_sold_certificates: not_sold_certificates.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableColumn {
    pub label: &'static str,
    pub width: Option<f32>,
    pub numeric: bool,
}

impl TableColumn {
    const fn text(label: &'static str) -> Self {
        Self {
            label,
            width: None,
            numeric: false,
        }
    }

    const fn sized(label: &'static str, width: f32, numeric: bool) -> Self {
        Self {
            label,
            width: Some(width),
            numeric,
        }
    }
}

pub const ASSET_TABLE_COLUMNS: [TableColumn; 7] = [
    TableColumn::sized("#", 60.0, false),
    TableColumn::text("Owner"),
    TableColumn::text("Facility Name"),
    TableColumn::text("Region, Country"),
    TableColumn::sized("Type", 140.0, false),
    TableColumn::sized("Nameplate Capacity (kW)", 125.45, true),
    TableColumn::sized("Meter Read (kWh)", 135.89, true),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TableFooter {
    pub label: &'static str,
    pub colspan: usize,
    pub meter_read_total_kwh: f64,
}

/// Footer of the current page: a label over the first six columns, then the meter read sum.
pub fn table_footer(rows: &[AssetRow]) -> TableFooter {
    TableFooter {
        label: "Total",
        colspan: ASSET_TABLE_COLUMNS.len() - 1,
        meter_read_total_kwh: rows.iter().map(|row| row.meter_read_kwh).sum(),
    }
}

/// [`PageFetcher`] over the asset list in [`AssetTableProps`].
#[derive(Debug)]
pub struct ProducingAssetTable {
    props: AssetTableProps,
    directory: Arc<dyn UserDirectory>,
}

impl ProducingAssetTable {
    pub fn new(props: AssetTableProps, directory: Arc<dyn UserDirectory>) -> Self {
        Self { props, directory }
    }
}

#[async_trait]
impl PageFetcher for ProducingAssetTable {
    type Row = AssetRow;

    fn from_snapshot(snap: &CommandSnapshot) -> Result<Self, LoadError> {
        let props = snap.try_state::<AssetTableProps>()?.clone();
        let directory = Arc::clone(&snap.try_state::<OriginServices>()?.directory);
        Ok(Self::new(props, directory))
    }

    async fn fetch_page(&self, params: PageParams) -> Result<PageData<AssetRow>, LoadError> {
        let filters = params
            .filters
            .iter()
            .map(ColumnFilter::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let source: Vec<&ProducingAsset> = self
            .props
            .producing_assets
            .iter()
            .filter(|asset| filters.iter().all(|filter| filter.matches(asset)))
            .collect();
        let total = source.len();

        let page: Vec<ProducingAsset> = source
            .into_iter()
            .skip(params.offset)
            .take(params.page_size)
            .cloned()
            .collect();

        let mut enriched =
            enrich_producing_assets(page, &self.props.certificates, &self.directory).await?;

        if self.props.switched_to_organization {
            let current = &self.props.current_user.id;
            enriched.retain(|item| item.producing_asset.is_owned_by(current));
        }

        log::debug!(
            "Producing assets page at offset {}: {} rows of {total}",
            params.offset,
            enriched.len()
        );
        Ok(PageData {
            rows: enriched.into_iter().map(AssetRow::from).collect(),
            total,
        })
    }
}
