use std::sync::Arc;

use tokio::task::JoinSet;

use crate::model::{Certificate, ProducingAsset};
use crate::pagination::LoadError;
use crate::services::UserDirectory;

/// A producing asset with the data the table derives from related records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedProducingAsset {
    pub producing_asset: ProducingAsset,
    pub organization_name: String,
    pub not_sold_certificates: Vec<Certificate>,
}

/// Certificates of `asset` that its owner still holds.
pub fn not_sold_certificates(
    asset: &ProducingAsset,
    certificates: &[Certificate],
) -> Vec<Certificate> {
    certificates
        .iter()
        .filter(|certificate| certificate.asset_id == asset.id && certificate.owner == asset.owner)
        .cloned()
        .collect()
}

/// Enrich every asset, resolving owner organizations concurrently.
///
/// Output order matches input order. The first failed lookup aborts the rest.
pub async fn enrich_producing_assets(
    assets: Vec<ProducingAsset>,
    certificates: &[Certificate],
    directory: &Arc<dyn UserDirectory>,
) -> Result<Vec<EnrichedProducingAsset>, LoadError> {
    let mut lookups = JoinSet::new();
    for (index, asset) in assets.iter().enumerate() {
        let directory = Arc::clone(directory);
        let owner = asset.owner.clone();
        lookups.spawn(async move { (index, directory.organization(&owner).await) });
    }

    let mut organizations: Vec<Option<String>> = vec![None; assets.len()];
    while let Some(joined) = lookups.join_next().await {
        let (index, organization) = joined.map_err(|err| LoadError::Task(err.to_string()))?;
        if let Some(slot) = organizations.get_mut(index) {
            *slot = Some(organization?);
        }
    }

    Ok(assets
        .into_iter()
        .zip(organizations)
        .map(|(producing_asset, organization_name)| EnrichedProducingAsset {
            not_sold_certificates: not_sold_certificates(&producing_asset, certificates),
            organization_name: organization_name.unwrap_or_default(),
            producing_asset,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{Address, AssetId, OffChainProperties};
    use crate::services::LookupError;

    /// Answers later for earlier owners, so completion order is reversed.
    #[derive(Debug)]
    struct SlowDirectory;

    #[async_trait]
    impl UserDirectory for SlowDirectory {
        async fn organization(&self, address: &Address) -> Result<String, LookupError> {
            let delay = match address.as_str() {
                "0x1" => 30,
                "0x2" => 10,
                "0xbad" => return Err(LookupError::UnknownUser(address.clone())),
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("Org {address}"))
        }
    }

    fn asset(id: u64, owner: &str) -> ProducingAsset {
        ProducingAsset {
            id: AssetId(id),
            owner: Address::new(owner),
            off_chain_properties: OffChainProperties {
                facility_name: format!("Facility {id}"),
                region: "Saxony".to_owned(),
                country: "DE".to_owned(),
                capacity_wh: 1000,
                asset_type: "Solar".to_owned(),
            },
            last_smart_meter_read_wh: 0,
        }
    }

    fn certificate(id: u64, asset_id: u64, owner: &str) -> Certificate {
        Certificate {
            id,
            asset_id: AssetId(asset_id),
            owner: Address::new(owner),
            power_wh: 100,
        }
    }

    #[test]
    fn not_sold_means_same_asset_and_still_with_owner() {
        let certificates = vec![
            certificate(1, 0, "0x1"),
            certificate(2, 0, "0xbuyer"),
            certificate(3, 1, "0x1"),
            certificate(4, 0, "0X1"),
        ];

        let kept = not_sold_certificates(&asset(0, "0x1"), &certificates);

        let ids: Vec<u64> = kept.iter().map(|certificate| certificate.id).collect();
        assert_eq!(ids, vec![1, 4], "only certificates still held by the owner");
    }

    #[tokio::test]
    async fn keeps_input_order_with_out_of_order_lookups() {
        let directory: Arc<dyn UserDirectory> = Arc::new(SlowDirectory);
        let assets = vec![asset(0, "0x1"), asset(1, "0x2"), asset(2, "0x3")];

        let enriched = enrich_producing_assets(assets, &[], &directory)
            .await
            .expect("all owners resolve");

        let names: Vec<&str> = enriched
            .iter()
            .map(|item| item.organization_name.as_str())
            .collect();
        assert_eq!(names, vec!["Org 0x1", "Org 0x2", "Org 0x3"], "organizations keep input order");
    }

    #[tokio::test]
    async fn failed_lookup_fails_the_page() {
        let directory: Arc<dyn UserDirectory> = Arc::new(SlowDirectory);
        let assets = vec![asset(0, "0x1"), asset(1, "0xbad")];

        let result = enrich_producing_assets(assets, &[], &directory).await;

        assert!(
            matches!(result, Err(LoadError::Lookup(LookupError::UnknownUser(_)))),
            "unregistered owner aborts enrichment, got {result:?}"
        );
    }

    #[tokio::test]
    async fn empty_page_needs_no_lookups() {
        let directory: Arc<dyn UserDirectory> = Arc::new(SlowDirectory);

        let enriched = enrich_producing_assets(Vec::new(), &[], &directory)
            .await
            .expect("nothing to resolve");

        assert!(enriched.is_empty(), "empty page enriches to nothing");
    }
}
