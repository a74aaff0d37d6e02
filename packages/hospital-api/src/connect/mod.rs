use crate::{
    config::{DatabaseConfig, ServerConfig},
    error::Error,
    log::{DEVELOPMENT, STORE},
    tls,
};
use axum::Router;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, warn};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRY_COUNT: u32 = 3;

///
/// Connect to the document database
///
/// Each attempt is bounded by `database.connection_timeout`.
/// Failed attempts are retried with exponential back-off.
///
pub async fn database(config: &DatabaseConfig) -> Result<Client, Error> {
    let connection_string = config.to_connection_string()?;
    let mut retry_count = 0;

    loop {
        debug!(target: STORE, msg = "Connecting to database", database = %config);

        match time::timeout(
            config.connection_timeout(),
            connect(&connection_string, config),
        )
        .await
        {
            Ok(Ok(client)) => return Ok(client),
            Ok(Err(err)) => {
                warn!(
                    target: STORE,
                    msg = "Could not connect to database",
                    retries = retry_count,
                    error = err.to_string()
                );
            }
            Err(_) => {
                warn!(
                    target: STORE,
                    msg = "Database connection timed out",
                    retries = retry_count,
                    timeout_ms = config.connection_timeout
                );
            }
        }

        if retry_count >= MAX_RETRY_COUNT {
            error!(
                msg = "Could not connect to database",
                database = %config,
            );
            error!(msg = "Confirm that the database configuration is correct");
            return Err(Error::DatabaseConnection {
                retries: retry_count,
            });
        }

        time::sleep(retry_delay(retry_count)).await;
        retry_count += 1;
    }
}

async fn connect(connection_string: &str, config: &DatabaseConfig) -> Result<Client, Error> {
    if config.with_tls {
        let tls = tls::connector(config)?;
        let (client, connection) = tokio_postgres::connect(connection_string, tls).await?;
        spawn_connection(connection);
        Ok(client)
    } else {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;
        spawn_connection(connection);
        Ok(client)
    }
}

fn spawn_connection(
    connection: impl Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
) {
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(target: STORE, msg = "Connection error", error = err.to_string());
        }
    });
}

pub async fn bind_with_retry(server: &ServerConfig) -> Result<TcpListener, Error> {
    let address = &server.to_socket_address();
    let mut retry_count = 0;

    loop {
        match TcpListener::bind(address).await {
            Ok(listener) => {
                info!(msg = "Server waiting for connections", address);
                return Ok(listener);
            }
            Err(err) => {
                if retry_count >= MAX_RETRY_COUNT {
                    error!(
                        msg = "Error binding connection",
                        retries = MAX_RETRY_COUNT,
                        error = err.to_string()
                    );
                    return Err(err.into());
                }
                debug!(target: DEVELOPMENT, msg = "Retrying bind", address, retry_count);
            }
        };

        time::sleep(retry_delay(retry_count)).await;
        retry_count += 1;
    }
}

///
/// Serve `router` until `shutdown` resolves, then give requests in flight up to `timeout`
///
/// Returns as soon as the server stops on its own.
///
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()>,
    timeout: Duration,
) -> Result<(), Error> {
    let (notify, stopped) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await
    });

    supervise(server, notify, shutdown, timeout).await
}

async fn supervise(
    mut server: JoinHandle<io::Result<()>>,
    notify: oneshot::Sender<()>,
    shutdown: impl Future<Output = ()>,
    timeout: Duration,
) -> Result<(), Error> {
    tokio::select! {
        () = shutdown => {}
        joined = &mut server => {
            error!(msg = "Server stopped before shutdown was requested");
            return Ok(joined??);
        }
    }

    info!(msg = "Shutting down Hospital API");
    let _ = notify.send(());

    info!(msg = "Waiting for requests in flight");

    match time::timeout(timeout, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(msg = "Terminated requests still in flight after shutdown timeout"),
    }

    Ok(())
}

fn retry_delay(retry_count: u32) -> Duration {
    let sleep_duration_ms = (100 * 2_u64.pow(retry_count)).min(MAX_RETRY_DELAY.as_millis() as _);
    Duration::from_millis(sleep_duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_backs_off_to_a_ceiling() {
        assert_eq!(retry_delay(0), Duration::from_millis(100));
        assert_eq!(retry_delay(1), Duration::from_millis(200));
        assert_eq!(retry_delay(3), Duration::from_millis(800));
        assert_eq!(retry_delay(10), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn bind_to_an_ephemeral_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        };
        let listener = bind_with_retry(&server).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn failed_server_returns_without_a_shutdown_signal() {
        let (notify, _stopped) = oneshot::channel();
        let server = tokio::spawn(async { Err(io::Error::other("accept loop failed")) });

        let result = time::timeout(
            Duration::from_secs(5),
            supervise(
                server,
                notify,
                std::future::pending::<()>(),
                Duration::from_secs(1),
            ),
        )
        .await;

        assert!(matches!(result, Ok(Err(Error::Io(_)))));
    }

    #[tokio::test]
    async fn panicked_server_is_reported() {
        let (notify, _stopped) = oneshot::channel();
        let server = tokio::spawn(async {
            if true {
                panic!("server task panicked");
            }
            Ok(())
        });

        let result = supervise(
            server,
            notify,
            std::future::pending::<()>(),
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(Error::ServerTask(_))));
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", axum::routing::get(|| async { "ok" }));

        let result = time::timeout(
            Duration::from_secs(5),
            serve(listener, router, async {}, Duration::from_secs(1)),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
