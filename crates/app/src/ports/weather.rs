//! Weather port: current conditions.

use std::future::Future;

use chime_domain::weather::WeatherSample;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    #[error("weather source unavailable: {reason}")]
    Unavailable { reason: String },
}

pub trait WeatherSource: Send + Sync {
    fn current(&self) -> impl Future<Output = Result<WeatherSample, WeatherError>> + Send;
}

impl<T: WeatherSource> WeatherSource for std::sync::Arc<T> {
    fn current(&self) -> impl Future<Output = Result<WeatherSample, WeatherError>> + Send {
        (**self).current()
    }
}
