//! Check every litter box and fire the webhook trigger when any is full.
//!
//! See [`petkit_worker::config`] for the environment variables read here.

use anyhow::Context;

use petkit_client::{PetkitClient, Session, SessionScope};
use petkit_events::{WebhookDelivery, WebhookTrigger};
use petkit_worker::config::{NotifyConfig, VendorConfig};
use petkit_worker::logging;
use petkit_worker::notify::{run_fullness_check, WebhookNotifier};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let vendor = VendorConfig::from_env()?;
    let notify = NotifyConfig::from_env()?;

    let client = PetkitClient::new(&vendor.api_url, vendor.timeout)?;
    let mut session = Session::new(vendor.credentials);

    let notifier = WebhookNotifier::new(
        WebhookDelivery::new(&notify.webhook_url, vendor.timeout)?,
        WebhookTrigger::new(&notify.trigger_event, &notify.webhook_key),
    );

    let mut scope = SessionScope::new(&client, &mut session);
    let outcome = run_fullness_check(&mut scope, &notifier)
        .await
        .context("fullness check failed")?;

    tracing::info!(full = outcome.full_devices.len(), "Fullness check done");
    Ok(())
}
