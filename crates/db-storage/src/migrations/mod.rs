// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::{Context, Result};
use refinery::{embed_migrations, Report};
use refinery_core::tokio_postgres::{Config, NoTls};
use tokio::sync::oneshot;
use tracing::Instrument;

embed_migrations!("./src/migrations");

#[tracing::instrument(skip(config))]
async fn migrate(config: Config) -> Result<Report> {
    log::debug!("config: {:?}", config);

    let (mut client, conn) = config
        .connect(NoTls)
        .await
        .context("Unable to connect to database")?;

    let (tx, rx) = oneshot::channel();

    tokio::spawn(
        async move {
            if let Err(e) = conn.await {
                log::error!("connection error: {}", e)
            }

            tx.send(()).expect("Channel unexpectedly dropped");
        }
        .instrument(tracing::Span::current()),
    );

    // The runner is specified through the `embed_migrations` macro
    let report = migrations::runner().run_async(&mut client).await?;

    drop(client);

    // wait for the connection to close
    rx.await?;

    Ok(report)
}

pub async fn migrate_from_url(url: &str) -> Result<Report> {
    let config = url.parse::<Config>()?;
    migrate(config).await
}

mod type_polyfills {
    use barrel::types::{BaseType, Type};

    /// An SQL datetime type
    ///
    /// Barrel only supports TIMESTAMP which is without any timezone information
    pub fn datetime() -> Type {
        Type {
            nullable: false,
            unique: false,
            increments: false,
            indexed: false,
            primary: false,
            default: None,
            size: None,
            inner: BaseType::Custom("TIMESTAMPTZ"),
        }
    }
}

#[cfg(test)]
mod migration_tests {
    use anyhow::Result;
    use serial_test::serial;

    /// Tests the refinery database migration.
    ///
    /// A database has to be specified via the environment variable
    /// * POSTGRES_URL - url to an empty postgres database
    ///
    /// The test is skipped when no url is set.
    #[tokio::test]
    #[serial]
    async fn test_migration() -> Result<()> {
        let url = match std::env::var("POSTGRES_URL") {
            Ok(url) => url,
            Err(_) => return Ok(()),
        };

        let report = super::migrate_from_url(&url).await?;

        assert!(!report.applied_migrations().is_empty());

        Ok(())
    }
}
