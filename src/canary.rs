//! Canary heartbeat: fire-and-forget UDP packets so an external watcher
//! can tell the process is still alive. Errors end the loop silently --
//! this is self-monitoring, not part of the forwarding path, so it must
//! never become another reason to exit.

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::sleep;

/// Sends `P<pid>D` to `host:port` once per second until the send itself
/// fails -- a dial or send failure is fatal to the heartbeat loop, not to
/// the process.
pub async fn run(host: String, port: String) {
    let message = format!("P{}D", std::process::id());

    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(err) => {
            log::warn!("canary: failed to open udp socket: {}", err);
            return;
        }
    };

    let target = format!("{host}:{port}");
    if let Err(err) = socket.connect(&target).await {
        log::warn!("canary: failed to connect to {}: {}", target, err);
        return;
    }

    loop {
        if let Err(err) = socket.send(message.as_bytes()).await {
            log::warn!("canary: send failed, stopping heartbeat: {}", err);
            return;
        }
        sleep(Duration::from_secs(1)).await;
    }
}
