//! Binds a [`PetkitClient`] to a caller-owned [`Session`].

use async_trait::async_trait;

use petkit_core::device::{Device, DeviceState, RawEvent};
use petkit_core::directory::{DateRange, DeviceDirectory};
use petkit_core::pets::{Pet, RosterSource};

use crate::api::PetkitClient;
use crate::error::PetkitError;
use crate::session::Session;

/// Borrowed client + session pair for one poll cycle.
///
/// Implements the core [`DeviceDirectory`] and [`RosterSource`] seams so
/// the cycle code never touches HTTP or login state directly.
pub struct SessionScope<'a> {
    client: &'a PetkitClient,
    session: &'a mut Session,
}

impl<'a> SessionScope<'a> {
    pub fn new(client: &'a PetkitClient, session: &'a mut Session) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl DeviceDirectory for SessionScope<'_> {
    type Error = PetkitError;

    async fn list_devices(&mut self) -> Result<Vec<Device>, PetkitError> {
        self.client.discover_devices(self.session).await
    }

    async fn fetch_records(
        &mut self,
        device: &Device,
        range: &DateRange,
    ) -> Result<Vec<RawEvent>, PetkitError> {
        let mut events = Vec::new();
        for day in range.days() {
            let page = self.client.device_records(self.session, device, day).await?;
            tracing::debug!(device = %device.name, %day, events = page.len(), "Fetched record page");
            events.extend(page);
        }
        Ok(events)
    }

    async fn device_state(&mut self, device: &Device) -> Result<DeviceState, PetkitError> {
        self.client.device_state(self.session, device).await
    }
}

#[async_trait]
impl RosterSource for SessionScope<'_> {
    type Error = PetkitError;

    async fn fetch_roster(&mut self) -> Result<Vec<Pet>, PetkitError> {
        let pets = self.client.pets(self.session).await?;
        tracing::info!(pets = pets.len(), "Loaded pet roster");
        Ok(pets)
    }
}
