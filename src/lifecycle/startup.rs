//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the notification listener and work out the callback URL
//! - Start the HTTP server and the subscription task
//! - Build the control loop from its collaborators and run it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound before subscribing so notifications are never lost

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::agent::CommandRunner;
use crate::config::{ListenerConfig, ManagerConfig, SidecarConfig};
use crate::control::{Controller, ControllerError, EventSources};
use crate::http::{HttpState, NotificationServer};
use crate::lifecycle::{signals, Shutdown};
use crate::manager::{spawn_subscription, ManagerClient};
use crate::resilience::RetryPolicy;
use crate::synth::{BaseConfiguration, ConfigWriter};

/// Capacity of the endpoint → control loop queue.
const EVENT_QUEUE: usize = 64;

/// How long the HTTP server may take to drain after the loop ends.
const SERVER_DRAIN: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build manager client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no callback address: {0}")]
    CallbackAddress(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Run the sidecar until shutdown or a fatal condition.
pub async fn run(config: SidecarConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let loop_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    // 1. Listener
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listener.bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        addr: config.listener.bind_address.clone(),
        source,
    })?;
    tracing::info!(address = %local_addr, "Listening for notifications");

    let callback_url = resolve_callback_url(&config.listener, &config.manager, local_addr).await?;
    tracing::info!(callback = %callback_url, "Callback URL resolved");

    // 2. HTTP server
    let (events, notifications) = mpsc::channel(EVENT_QUEUE);
    let server = NotificationServer::new(
        &config.listener,
        HttpState {
            events,
            config_file: config.agent.config_file.clone().into(),
        },
    );
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    if shutdown.is_triggered() {
        tracing::info!("Shutdown requested during startup, agent not launched");
        drain_server(server_task).await;
        return Ok(());
    }

    // 3. Subscription
    let client = ManagerClient::new(&config.manager)?;
    let subscription = spawn_subscription(
        client.clone(),
        callback_url,
        RetryPolicy::from_config(&config.manager),
    );

    // 4. Control loop
    let writer = ConfigWriter::new(
        BaseConfiguration::from_config(&config),
        &config.agent.config_file,
    );
    let controller = Controller::new(CommandRunner::from_config(&config.agent), client, writer)
        .fetch_on_subscribe(config.manager.fetch_on_startup);
    let sources = EventSources {
        notifications,
        subscription: Some(subscription),
        shutdown: loop_shutdown,
    };
    let result = controller.run(sources).await;

    shutdown.trigger();
    drain_server(server_task).await;

    result.map_err(StartupError::from)
}

async fn drain_server(server_task: JoinHandle<std::io::Result<()>>) {
    match tokio::time::timeout(SERVER_DRAIN, server_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server failed"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task panicked"),
        Err(_) => tracing::warn!("HTTP server did not drain in time"),
    }
}

/// URL the manager should post notifications to.
///
/// `advertise_address` wins when set (its port defaults to the bound one);
/// otherwise the local address of the route towards the manager is used.
pub async fn resolve_callback_url(
    listener: &ListenerConfig,
    manager: &ManagerConfig,
    bound: SocketAddr,
) -> Result<String, StartupError> {
    let authority = match &listener.advertise_address {
        Some(advertised) => with_port(advertised, bound.port()),
        None => {
            let ip = match outbound_ipv4(&manager.base_url).await {
                Some(ip) => ip,
                None if !bound.ip().is_unspecified() => bound.ip(),
                None => {
                    return Err(StartupError::CallbackAddress(
                        "no routable local address; set listener.advertise_address".into(),
                    ))
                }
            };
            SocketAddr::new(ip, bound.port()).to_string()
        }
    };
    Ok(format!("http://{}{}", authority, listener.notification_path))
}

fn with_port(host: &str, port: u16) -> String {
    match host.rsplit_once(':') {
        Some((_, p)) if p.parse::<u16>().is_ok() => host.to_string(),
        _ => format!("{}:{}", host, port),
    }
}

/// Local IPv4 address the kernel would use to reach the manager. UDP connect
/// sends nothing; it only selects a route.
async fn outbound_ipv4(manager_url: &str) -> Option<IpAddr> {
    let url = url::Url::parse(manager_url).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    if let Err(e) = socket.connect((host.as_str(), port)).await {
        tracing::debug!(host = %host, error = %e, "No route to manager");
        return None;
    }
    let ip = socket.local_addr().ok()?.ip();
    (ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound() -> SocketAddr {
        "0.0.0.0:8080".parse().unwrap()
    }

    #[tokio::test]
    async fn test_advertised_address_gets_bound_port() {
        let mut listener = ListenerConfig::default();
        listener.advertise_address = Some("sidecar.ns.svc".into());

        let url = resolve_callback_url(&listener, &ManagerConfig::default(), bound())
            .await
            .unwrap();
        assert_eq!(url, "http://sidecar.ns.svc:8080/xapp_notification/");
    }

    #[tokio::test]
    async fn test_advertised_address_keeps_explicit_port() {
        let mut listener = ListenerConfig::default();
        listener.advertise_address = Some("10.1.2.3:9999".into());

        let url = resolve_callback_url(&listener, &ManagerConfig::default(), bound())
            .await
            .unwrap();
        assert_eq!(url, "http://10.1.2.3:9999/xapp_notification/");
    }

    #[tokio::test]
    async fn test_specific_bind_ip_is_fallback() {
        let listener = ListenerConfig::default();
        let mut manager = ManagerConfig::default();
        manager.base_url = "not a url".into();

        let url = resolve_callback_url(&listener, &manager, "192.0.2.7:8080".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(url, "http://192.0.2.7:8080/xapp_notification/");
    }

    #[tokio::test]
    async fn test_unresolvable_wildcard_bind_is_error() {
        let listener = ListenerConfig::default();
        let mut manager = ManagerConfig::default();
        manager.base_url = "not a url".into();

        let err = resolve_callback_url(&listener, &manager, bound()).await.unwrap_err();
        assert!(matches!(err, StartupError::CallbackAddress(_)));
    }
}
