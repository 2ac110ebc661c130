//! # chimed: chime daemon
//!
//! Composition root that wires all adapters together and runs the engine.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the event bus, the wake timer and the virtual host collaborators
//! - Construct the automation engine, health reminders and weather alerts,
//!   injecting adapters via port traits
//! - Start the engine when the stored rule document is enabled
//! - Build the axum router and serve the control API
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use chime_adapter_http_axum::state::AppState;
use chime_adapter_storage_sqlite_sqlx::{SqliteHistoryRepository, SqliteRuleRepository};
use chime_adapter_virtual::{ConsoleEffects, StaticWeatherSource, VirtualDevice, VirtualWakeLock};
use chime_app::automation_engine::AutomationEngine;
use chime_app::busy_guard::BusyGuard;
use chime_app::event_bus::InProcessEventBus;
use chime_app::ports::SystemClock;
use chime_app::services::action_executor::ActionExecutor;
use chime_app::services::execution_log::ExecutionLogService;
use chime_app::services::health_reminders::HealthReminderService;
use chime_app::services::rule_store::RuleStore;
use chime_app::services::wake_scheduler::WakeScheduler;
use chime_app::services::weather_alerts::WeatherAlertService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = chime_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Event bus and timer: wake points travel on the same bus as device events
    let bus = Arc::new(InProcessEventBus::new());
    let timer = Arc::new(chime_app::wake_timer::TokioWakeTimer::new(
        Arc::clone(&bus),
        SystemClock,
    ));

    // Virtual host
    let device = Arc::new(VirtualDevice::new(
        Arc::clone(&bus),
        config.device.battery_level,
        config.device.plugged,
    ));
    let effects = Arc::new(ConsoleEffects::new(config.device.installed_targets.clone()));

    // Engine
    let engine = AutomationEngine::new(
        RuleStore::new(SqliteRuleRepository::new(pool.clone())),
        ExecutionLogService::new(SqliteHistoryRepository::new(pool), SystemClock),
        ActionExecutor::new(Arc::clone(&effects)),
        WakeScheduler::new(Arc::clone(&timer), SystemClock),
        BusyGuard::new(VirtualWakeLock::new(), config.engine.busy_guard_ceiling()),
        Arc::clone(&device),
    );
    engine.start().await;

    // Satellite services
    let reminders = HealthReminderService::new(
        Arc::clone(&timer),
        Arc::clone(&effects),
        Arc::clone(&bus),
        SystemClock,
        config.health.reminders.clone(),
    );
    if config.health.enabled {
        reminders.start_all();
    }

    let mut background: Vec<JoinHandle<()>> = Vec::new();
    if config.weather.enabled {
        let source = match config.weather.sample.clone() {
            Some(sample) => StaticWeatherSource::new(sample),
            None => StaticWeatherSource::default(),
        };
        let alerts = WeatherAlertService::new(
            source,
            Arc::clone(&effects),
            config.weather.thresholds.clone(),
        );
        background.push(spawn_weather_checks(alerts, config.weather.check_interval()));
    }
    if let Some(interval) = config.device.tick_interval() {
        background.push(device.spawn_simulation(interval));
    }

    // HTTP
    // Injected events go through the device so its readings follow them
    let state = AppState::from_arcs(Arc::new(engine.clone()), Arc::clone(&device));
    let app = chime_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "chimed listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in background {
        task.abort();
    }
    reminders.stop_all();
    engine.stop().await;
    tracing::info!("chimed stopped");

    Ok(())
}

fn spawn_weather_checks<W, F>(
    alerts: WeatherAlertService<W, F>,
    every: Duration,
) -> JoinHandle<()>
where
    W: chime_app::ports::WeatherSource + 'static,
    F: chime_app::ports::Effects + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let raised = alerts.check_and_notify().await;
            tracing::debug!(alerts = raised.len(), "weather checked");
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
