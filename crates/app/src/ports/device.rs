//! Device port: battery and power state of the host.

use crate::ports::EventSource;

/// Current device readings plus the stream of their changes.
///
/// The subscription also carries wake-point deliveries: the composition root
/// routes the wake timer onto the same event stream.
pub trait DeviceMonitor: EventSource {
    /// Latest battery level in percent, when known.
    fn battery_level(&self) -> Option<u8>;

    /// Whether the battery is currently charging.
    fn is_charging(&self) -> bool;
}

impl<T: DeviceMonitor> DeviceMonitor for std::sync::Arc<T> {
    fn battery_level(&self) -> Option<u8> {
        (**self).battery_level()
    }

    fn is_charging(&self) -> bool {
        (**self).is_charging()
    }
}
