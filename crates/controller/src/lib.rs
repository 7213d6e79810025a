// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Core of the roomplanner booking controller
//!
//! Wires settings, database, RabbitMQ and the service layer together and
//! drives the notification delivery worker.
use crate::services::{
    CalDavSync, CalendarSync, CalendarSyncHandle, DisabledCalendarSync, EmployeeService,
    EventService, NotificationScheduler, NotificationWorker, NotifyService, OfficeService,
    OrganizationService, RoomService,
};
use crate::settings::{Settings, SharedSettings};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use database::Db;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

mod cli;
mod trace;

pub mod services;
pub mod settings;

/// Wrapper of the main function. Correctly outputs the error to the logging utility or stderr.
pub async fn try_or_exit<T, F>(f: F) -> T
where
    F: std::future::Future<Output = Result<T>>,
{
    match f.await {
        Ok(ok) => ok,
        Err(err) => {
            if log::log_enabled!(log::Level::Error) {
                log::error!("Crashed with error: {:?}", err);
            } else {
                eprintln!("Crashed with error: {err:?}");
            }

            std::process::exit(-1);
        }
    }
}

/// Controller struct representation containing all fields required to drive the booking platform
pub struct Controller {
    /// Settings loaded on [Controller::create]
    pub startup_settings: Arc<Settings>,

    /// Cloneable shared settings, can be used to reload settings from.
    pub shared_settings: SharedSettings,

    db: Arc<Db>,

    /// General purpose rabbitmq channel
    pub rabbitmq_channel: Option<Arc<lapin::Channel>>,

    pub event_service: EventService,
    pub room_service: RoomService,
    pub office_service: OfficeService,
    pub organization_service: OrganizationService,
    pub employee_service: EmployeeService,

    notify_service: NotifyService,

    /// Shutdown signal which is triggered when the controller is exiting, either because a fatal
    /// error occurred or a user requested the shutdown.
    pub shutdown: broadcast::Sender<()>,
}

impl Controller {
    /// Tries to create a controller from CLI arguments and then the settings.
    ///
    /// This can return Ok(None) which would indicate that the controller executed a CLI
    /// subprogram (e.g. `--migrate-only`) and must now exit.
    ///
    /// Otherwise it will return itself which can be run using [`Controller::run`]
    pub async fn create(program_name: &str) -> Result<Option<Self>> {
        let args = cli::parse_args();

        let settings = settings::load_settings(&args)?;

        trace::init(&settings.logging)?;

        log::info!("Starting {}", program_name);

        db_storage::migrations::migrate_from_url(&settings.database.url)
            .await
            .context("Failed to migrate database")?;

        if args.migrate_only {
            return Ok(None);
        }

        let controller = Self::init(settings).await?;

        Ok(Some(controller))
    }

    #[tracing::instrument(err, skip(settings))]
    async fn init(settings: Settings) -> Result<Self> {
        let settings = Arc::new(settings);
        let shared_settings: SharedSettings = Arc::new(ArcSwap::from(settings.clone()));

        // Connect to postgres
        let db = Arc::new(
            Db::connect_url(
                &settings.database.url,
                settings.database.max_connections,
                Some(settings.database.min_idle_connections),
            )
            .context("Failed to connect to database")?,
        );

        // Connect to RabbitMQ when configured
        let rabbitmq_channel = if let Some(rabbit_mq) = &settings.rabbit_mq {
            let connection = lapin::Connection::connect(
                &rabbit_mq.url,
                lapin::ConnectionProperties::default()
                    .with_executor(tokio_executor_trait::Tokio::current())
                    .with_reactor(tokio_reactor_trait::Tokio),
            )
            .await
            .context("Failed to connect to RabbitMQ")?;

            let channel = connection
                .create_channel()
                .await
                .context("Could not create rabbitmq channel")?;

            Some(Arc::new(channel))
        } else {
            None
        };

        let notify_service = NotifyService::new(shared_settings.clone(), rabbitmq_channel.clone());

        let calendar: Arc<dyn CalendarSync> = match &settings.calendar {
            Some(caldav) => Arc::new(CalDavSync::new(caldav)?),
            None => Arc::new(DisabledCalendarSync),
        };

        let scheduler =
            NotificationScheduler::new(settings.notifications.reminder_lead_minutes.clone());

        let event_service = EventService::new(
            db.clone(),
            scheduler,
            CalendarSyncHandle::new(calendar),
        );

        let (shutdown, _) = broadcast::channel::<()>(1);

        Ok(Self {
            startup_settings: settings,
            shared_settings,
            db: db.clone(),
            rabbitmq_channel,
            event_service,
            room_service: RoomService::new(db.clone()),
            office_service: OfficeService::new(db.clone()),
            organization_service: OrganizationService::new(db.clone()),
            employee_service: EmployeeService::new(db),
            notify_service,
            shutdown,
        })
    }

    /// Runs the controller until a fatal error occurred or a shutdown is requested (e.g. SIGTERM).
    pub async fn run(self) -> Result<()> {
        let worker = NotificationWorker::new(
            self.db.clone(),
            self.notify_service.clone(),
            Duration::from_secs(self.startup_settings.notifications.poll_interval_secs),
        );

        let worker_handle = tokio::spawn(worker.run(self.shutdown.subscribe()));

        wait_for_shutdown_signal().await?;

        log::info!("Shutting down");
        let _ = self.shutdown.send(());

        worker_handle
            .await
            .context("Notification worker panicked")?;

        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for ctrl-c")?,
        _ = sigterm.recv() => {}
    }

    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")
}
