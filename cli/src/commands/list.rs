//! Print one page of the producing asset table.

use anyhow::{Result, bail};
use origin_business::PageFilter;
use origin_business::producing_assets::{
    self, ASSET_TABLE_COLUMNS, AssetRow, ProducingAssetLoader, table_footer,
};
use origin_states::StateCtx;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tracing::instrument;

use crate::context::{await_pending_tasks, print_notifications};
use crate::output::Output;

fn format_quantity(value: f64) -> String {
    format!("{value:.3}")
}

/// Render rows with the table's column headers and a meter read total footer.
pub fn render_asset_table(rows: &[AssetRow]) -> String {
    let mut builder = Builder::default();
    builder.push_record(ASSET_TABLE_COLUMNS.iter().map(|column| column.label));

    for row in rows {
        builder.push_record([
            row.id.to_string(),
            row.organization_name.clone(),
            row.facility_name.clone(),
            row.region_country.clone(),
            row.asset_type.clone(),
            format_quantity(row.capacity_kw),
            format_quantity(row.meter_read_kwh),
        ]);
    }

    let footer = table_footer(rows);
    let mut footer_record = vec![String::new(); footer.colspan];
    footer_record[0] = footer.label.to_owned();
    footer_record.push(format_quantity(footer.meter_read_total_kwh));
    builder.push_record(footer_record);

    // Numeric columns are the trailing ones.
    let first_numeric = ASSET_TABLE_COLUMNS
        .iter()
        .position(|column| column.numeric)
        .unwrap_or(ASSET_TABLE_COLUMNS.len());

    let mut table = builder.build();
    table.with(Style::rounded());
    table.modify(Columns::new(first_numeric..), Alignment::right());
    table.to_string()
}

#[instrument(skip_all, name = "list", fields(page, mine, filters = filters.len()))]
pub async fn run_list(
    mut ctx: StateCtx,
    page: u32,
    mine: bool,
    filters: Vec<PageFilter>,
) -> Result<()> {
    let out = Output::new();

    producing_assets::switch_to_organization(&mut ctx, mine);
    producing_assets::mount(&mut ctx);
    if page > 1 || !filters.is_empty() {
        ProducingAssetLoader::request_page(&mut ctx, page, filters);
    }
    await_pending_tasks(&mut ctx).await;

    print_notifications(&mut ctx, &out);
    let state = producing_assets::page(&ctx);
    if let Some(err) = state.error() {
        let message = err.to_owned();
        ctx.shutdown().await;
        bail!("Could not load producing assets: {message}");
    }

    if state.rows.is_empty() {
        out.dim("No producing assets found.");
    } else {
        out.newline();
        out.print(render_asset_table(&state.rows));
    }
    out.page_summary(state.page, state.total_pages(), state.total);

    ctx.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use origin_business::producing_assets::EnrichedProducingAsset;
    use origin_business::{Address, AssetId, OffChainProperties, ProducingAsset};

    use super::*;

    fn row(id: u64, meter_read_wh: u64) -> AssetRow {
        AssetRow::from(EnrichedProducingAsset {
            producing_asset: ProducingAsset {
                id: AssetId(id),
                owner: Address::new("0x1"),
                off_chain_properties: OffChainProperties {
                    facility_name: format!("Site {id}"),
                    region: "Saxony".to_owned(),
                    country: "DE".to_owned(),
                    capacity_wh: 2500,
                    asset_type: "Solar".to_owned(),
                },
                last_smart_meter_read_wh: meter_read_wh,
            },
            organization_name: "Acme".to_owned(),
            not_sold_certificates: Vec::new(),
        })
    }

    #[test]
    fn table_has_headers_rows_and_total() {
        let rendered = render_asset_table(&[row(0, 1500), row(1, 500)]);

        assert!(rendered.contains("Nameplate Capacity (kW)"), "header row");
        assert!(rendered.contains("Site 1"), "facility name");
        assert!(rendered.contains("Saxony, DE"), "region and country joined");
        assert!(rendered.contains("2.500"), "capacity in kW");
        assert!(rendered.contains("Total"), "footer label");
        assert!(rendered.contains("2.000"), "footer sums 1.5 and 0.5 kWh");
    }
}
