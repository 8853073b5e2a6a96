//! Push notifications for litter-box state.
//!
//! - [`delivery::webhook`] -- IFTTT-style webhook trigger with retry.

pub mod delivery;

pub use delivery::webhook::{WebhookDelivery, WebhookError, WebhookTrigger};
