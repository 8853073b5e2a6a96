//! Poll every litter box on the account and append new records to the
//! configured spreadsheet.
//!
//! See [`petkit_worker::config`] for the environment variables read here.

use anyhow::Context;

use petkit_client::{PetkitClient, Session, SessionScope};
use petkit_core::directory::DateRange;
use petkit_sheets::google::ServiceAccountKey;
use petkit_sheets::{GoogleSheetsStore, IncrementalExporter};
use petkit_worker::config::{ExportConfig, VendorConfig};
use petkit_worker::cycle::run_export_cycle;
use petkit_worker::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let vendor = VendorConfig::from_env()?;
    let export = ExportConfig::from_env()?;

    let client = PetkitClient::new(&vendor.api_url, vendor.timeout)?;
    let mut session = Session::new(vendor.credentials);

    let key = ServiceAccountKey::from_json(&export.auth_json)
        .context("AUTH_JSON is not a usable service-account key")?;
    let store = GoogleSheetsStore::new(key, &export.spreadsheet_id, vendor.timeout)?;
    let exporter = IncrementalExporter::new(store);

    let range = DateRange::ending_today(export.lookback_days);
    tracing::info!(
        spreadsheet = %export.spreadsheet_id,
        start = %range.start(),
        end = %range.end(),
        "Export starting",
    );

    let mut scope = SessionScope::new(&client, &mut session);
    let summary = run_export_cycle(&mut scope, &exporter, &range)
        .await
        .context("export cycle failed")?;

    tracing::info!(
        appended = summary.appended,
        rejected = summary.rejected,
        watermark = ?summary.watermark,
        "Export done",
    );
    Ok(())
}
