//! Weather source returning a configured sample.

use std::sync::{Mutex, PoisonError};

use chime_app::ports::{WeatherError, WeatherSource};
use chime_domain::weather::WeatherSample;

/// A [`WeatherSource`] that never touches the network.
#[derive(Default)]
pub struct StaticWeatherSource {
    sample: Mutex<Option<WeatherSample>>,
}

impl StaticWeatherSource {
    #[must_use]
    pub fn new(sample: WeatherSample) -> Self {
        Self {
            sample: Mutex::new(Some(sample)),
        }
    }

    /// Replace the sample returned from now on; `None` makes the source unavailable.
    pub fn set(&self, sample: Option<WeatherSample>) {
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner) = sample;
    }
}

impl WeatherSource for StaticWeatherSource {
    async fn current(&self) -> Result<WeatherSample, WeatherError> {
        self.sample
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| WeatherError::Unavailable {
                reason: "no weather sample configured".to_string(),
            })
    }
}
