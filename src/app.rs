//! Application wiring
//!
//! Builds every component from the configuration and starts the long-running
//! tasks: one router task per consumed channel, the batch scheduler, the
//! optional outbound forwarder and the HTTP ingress.

use crate::{
    api::Server,
    batch::{BatchBuilder, BatchScheduler},
    bus::{EventBus, Forwarder, InMemoryBus},
    config::Config,
    directory::{DirectoryService, IpfsDirectoryService},
    intake::IntakeHandler,
    router::Router,
    saga::CompletionSaga,
    store::{ClaimStore, SqliteClaimStore},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct App {
    config: Config,
    bus: Arc<dyn EventBus>,
    router: Router,
}

impl App {
    /// Connect the production collaborators named in `config`.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(SqliteClaimStore::connect(&config.database.url).await?);
        let directory = Arc::new(IpfsDirectoryService::new(config.ipfs.url.clone()));
        let bus = Arc::new(InMemoryBus::new());
        Ok(Self::with_collaborators(config, store, directory, bus))
    }

    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn ClaimStore>,
        directory: Arc<dyn DirectoryService>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        let intake = Arc::new(IntakeHandler::new(store.clone()));
        let builder = Arc::new(BatchBuilder::new(store.clone(), directory, bus.clone()));
        let saga = Arc::new(CompletionSaga::new(store, bus.clone()));
        let router = Router::new(bus.clone(), intake, builder, saga);

        Self { config, bus, router }
    }

    /// Start the router, scheduler and forwarder, returning their task handles.
    pub async fn start_background(&self) -> anyhow::Result<Vec<JoinHandle<()>>> {
        let mut handles = self.router.start().await?;

        let scheduler = BatchScheduler::new(self.bus.clone(), self.config.batch.interval());
        handles.push(scheduler.spawn());

        if let Some(url) = &self.config.transport.forward_url {
            let forwarder = Forwarder::new(self.bus.clone(), url.clone());
            handles.extend(forwarder.start().await?);
            info!(url = %url, "outbound forwarder started");
        }

        Ok(handles)
    }

    /// Run until the ingress stops.
    pub async fn run(self) -> anyhow::Result<()> {
        let handles = self.start_background().await?;

        let server = Server::new(self.config.transport.clone(), self.bus.clone());
        let result = server.start().await;

        for handle in handles {
            handle.abort();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Channel, Event};
    use crate::testing::{FakeDirectory, FaultyStore};
    use crate::types::ClaimIdentifier;
    use std::time::Duration;

    fn config() -> Config {
        Config::parse(
            r#"
            [database]
            url = "sqlite::memory:"

            [transport]
            host = "127.0.0.1"
            port = 0

            [ipfs]
            url = "http://127.0.0.1:5001"

            [batch]
            create_next_batch_interval_secs = 3600
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_wired_app_builds_batches_from_claims() {
        let store = Arc::new(FaultyStore::new());
        let bus = Arc::new(InMemoryBus::new());
        let mut successes = bus.subscribe(Channel::CreateNextBatchSuccess).await.unwrap();
        let app = App::with_collaborators(config(), store.clone(), Arc::new(FakeDirectory::new()), bus.clone());

        let handles = app.start_background().await.unwrap();
        // Four router tasks and the scheduler; no forwarder without a forward_url.
        assert_eq!(handles.len(), 5);

        bus.publish_event(&Event::ClaimIdentifier(ClaimIdentifier {
            identifier: "Qm1".to_string(),
        }))
        .await
        .unwrap();
        for _ in 0..500 {
            if !store.query_pending().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        bus.publish_event(&Event::CreateNextBatchRequest).await.unwrap();

        let delivery = tokio::time::timeout(Duration::from_secs(5), successes.next())
            .await
            .unwrap()
            .unwrap();
        match delivery.decode().unwrap() {
            Event::CreateNextBatchSuccess(payload) => assert_eq!(payload.identifiers, vec!["Qm1"]),
            other => panic!("unexpected event {other:?}"),
        }

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_build_connects_sqlite() {
        let app = App::build(config()).await.unwrap();
        assert!(app.config.transport.forward_url.is_none());
    }
}
