//! # Connectivity Monitor
//!
//! One health probe per session start. There is no retry loop: a session
//! that comes up disconnected stays that way until the tool is re-entered
//! and the check runs again.

use log::{info, warn};

use crate::client::client::{RemoteClient, ServiceStatus};
use crate::client::transport::HttpTransport;

/// Runs the health check and logs the verdict.
pub async fn check<T: HttpTransport>(client: &RemoteClient<T>) -> ServiceStatus {
    info!("Checking steganography service at {}...", client.base_url());

    let status = client.health_check().await;
    match status {
        ServiceStatus::Connected => info!("✅ Service at {} is reachable", client.base_url()),
        ServiceStatus::Disconnected => {
            warn!("❌ Service at {} is not reachable", client.base_url())
        }
    }
    status
}
