use crate::config::Config;
use crate::dispatcher::{Dispatcher, PushoverClient};
use crate::receiver::{self, ServerState};
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How long shutdown waits for notifications still in flight.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Validate, bind and serve until `shutdown` resolves. Configuration errors
/// are returned before the listener is bound.
pub async fn run(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    config.validate().map_err(|e| {
        error!("{e}; provide --ptoken/PUSHOVER_TOKEN and --puser/PUSHOVER_USER");
        e
    })?;

    let client = PushoverClient::from_config(&config).context("failed to build Pushover client")?;
    let dispatcher = Dispatcher::new(Arc::new(client));
    let state = ServerState {
        dispatcher: dispatcher.clone(),
        body_limit: config.body_limit,
    };

    let (listener, _) = receiver::bind(config.listen_addr())
        .await
        .with_context(|| format!("couldn't bind {}", config.listen_addr()))?;

    receiver::serve(listener, state, shutdown)
        .await
        .context("HTTP server error")?;

    dispatcher.shutdown(SHUTDOWN_GRACE).await;
    info!("stopped");
    Ok(())
}
