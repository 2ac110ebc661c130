//! Weather alerts: checks current conditions and notifies on thresholds.

use chime_domain::weather::{ALERT_TITLE, WeatherAlert, WeatherThresholds};

use crate::ports::{Effects, Notification, WeatherSource};

pub struct WeatherAlertService<W, F> {
    source: W,
    effects: F,
    thresholds: WeatherThresholds,
}

impl<W: WeatherSource, F: Effects> WeatherAlertService<W, F> {
    pub fn new(source: W, effects: F, thresholds: WeatherThresholds) -> Self {
        Self {
            source,
            effects,
            thresholds,
        }
    }

    /// Fetch the current weather and notify every alert it raises.
    ///
    /// A failing source is logged and yields no alerts. Returns the alerts
    /// that were raised, whether or not their notification went through.
    #[tracing::instrument(skip(self))]
    pub async fn check_and_notify(&self) -> Vec<WeatherAlert> {
        let sample = match self.source.current().await {
            Ok(sample) => sample,
            Err(err) => {
                tracing::warn!(%err, "weather check skipped");
                return Vec::new();
            }
        };
        let alerts = self.thresholds.evaluate(&sample);
        for alert in &alerts {
            tracing::info!(kind = %alert.kind, message = %alert.message, "weather alert");
            let notification = Notification::new(ALERT_TITLE, alert.message.clone())
                .keyed(&format!("weather:{}", alert.kind));
            if let Err(err) = self.effects.notify(&notification).await {
                tracing::warn!(%err, kind = %alert.kind, "weather alert notification failed");
            }
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WeatherError;
    use crate::testing::RecordingEffects;
    use chime_domain::weather::{WeatherAlertKind, WeatherSample};
    use std::future::Future;

    struct FixedWeather(Result<WeatherSample, WeatherError>);

    impl WeatherSource for FixedWeather {
        fn current(&self) -> impl Future<Output = Result<WeatherSample, WeatherError>> + Send {
            let result = self.0.clone();
            async move { result }
        }
    }

    fn sample(description: &str, temperature_c: i32, aqi: Option<u32>) -> FixedWeather {
        FixedWeather(Ok(WeatherSample {
            description: description.to_string(),
            temperature_c,
            aqi,
        }))
    }

    #[tokio::test]
    async fn should_notify_each_alert_under_weather_title() {
        let service = WeatherAlertService::new(
            sample("雷阵雨", 36, Some(200)),
            RecordingEffects::default(),
            WeatherThresholds::default(),
        );

        let alerts = service.check_and_notify().await;

        let kinds: Vec<_> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WeatherAlertKind::Rain,
                WeatherAlertKind::Heat,
                WeatherAlertKind::Smog
            ]
        );
        let notifications = service.effects.notifications();
        assert_eq!(notifications.len(), 3);
        assert!(notifications.iter().all(|n| n.title == ALERT_TITLE));
        assert_ne!(notifications[0].id, notifications[1].id);
    }

    #[tokio::test]
    async fn should_stay_quiet_when_weather_is_mild() {
        let service = WeatherAlertService::new(
            sample("晴", 20, Some(30)),
            RecordingEffects::default(),
            WeatherThresholds::default(),
        );

        assert!(service.check_and_notify().await.is_empty());
        assert!(service.effects.notifications().is_empty());
    }

    #[tokio::test]
    async fn should_yield_nothing_when_source_fails() {
        let service = WeatherAlertService::new(
            FixedWeather(Err(WeatherError::Unavailable {
                reason: "timeout".to_string(),
            })),
            RecordingEffects::default(),
            WeatherThresholds::default(),
        );

        assert!(service.check_and_notify().await.is_empty());
    }
}
