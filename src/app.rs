use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, time::timeout};

use crate::{
    api,
    classifier::ClassifierService,
    config::AppConfig,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
};

pub struct InboxApp {
    listener: TcpListener,
    router: Router,
    classifier: ClassifierService,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl InboxApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let classifier =
            ClassifierService::load(&paths.artifact_path, config.model.max_input_bytes);
        let router = api::router(classifier.clone(), config.model.max_input_bytes);

        let listener = TcpListener::bind(config.server.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

        Ok(Self {
            listener,
            router,
            classifier,
            shutdown,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<()> {
        let InboxApp {
            listener,
            router,
            classifier,
            shutdown,
            config,
        } = self;

        let addr = listener.local_addr()?;
        tracing::info!(
            target: "lifecycle",
            %addr,
            model_ready = classifier.is_ready(),
            "inbox intelligence service listening"
        );

        let mut graceful = shutdown.subscribe();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { graceful.notified().await })
                .await
        });

        let mut shutdown_listener = shutdown.subscribe();
        tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!(target: "lifecycle", "shutdown signal received");
            }
            res = &mut server => {
                res.context("http server task panicked")?
                    .context("http server stopped unexpectedly")?;
                tracing::warn!(target: "lifecycle", "http server exited without a shutdown signal");
                return Ok(());
            }
        }

        let shutdown_timeout = config.server.shutdown_timeout;
        match timeout(shutdown_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => {
                tracing::error!(target: "lifecycle", error = %err, "http server stopped with an error");
            }
            Ok(Err(err)) => {
                if err.is_panic() {
                    tracing::error!(target: "lifecycle", "http server task panicked");
                }
            }
            Err(_) => {
                tracing::warn!(
                    target: "lifecycle",
                    "in-flight requests did not finish within {:?}; aborting",
                    shutdown_timeout
                );
                server.abort();
            }
        }

        tracing::info!(target: "lifecycle", "service stopped");
        Ok(())
    }
}
