//! Which litter boxes need emptying, phrased for a push notification.

use crate::device::{Device, DeviceState};

/// Separator between device names in the notification text.
pub const NAME_SEPARATOR: &str = " and ";

/// Names of the devices whose bin is full, in input order.
pub fn full_devices<'a, I>(states: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a Device, DeviceState)>,
{
    states
        .into_iter()
        .filter(|(_, state)| state.box_full)
        .map(|(device, _)| device.name.clone())
        .collect()
}

/// Single notification string for the full devices, or `None` if none are.
pub fn notification_text(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(NAME_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_full_devices_are_named() {
        let a = Device::new(1, "Hall", "t3");
        let b = Device::new(2, "Bath", "t3");
        let c = Device::new(3, "Garage", "t4");
        let names = full_devices([
            (&a, DeviceState { box_full: true }),
            (&b, DeviceState { box_full: false }),
            (&c, DeviceState { box_full: true }),
        ]);
        assert_eq!(names, vec!["Hall", "Garage"]);
        assert_eq!(notification_text(&names).as_deref(), Some("Hall and Garage"));
    }

    #[test]
    fn nothing_full_means_no_notification() {
        assert_eq!(notification_text(&[]), None);
    }
}
