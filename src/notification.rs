//! Desktop notifications via freedesktop D-Bus.

use std::collections::HashMap;
use zbus::{Connection, proxy};

/// How long notifications stay on screen, in milliseconds.
const EXPIRE_TIMEOUT_MS: i32 = 5000;

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Send a notification; returns its id.
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Icon names for the two kinds of notification we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Success,
    Failure,
}

impl Urgency {
    fn icon(self) -> &'static str {
        match self {
            Self::Success => "emblem-shared",
            Self::Failure => "dialog-error",
        }
    }

    fn level(self) -> u8 {
        match self {
            Self::Success => 1,
            Self::Failure => 2,
        }
    }
}

/// Send a system notification over the session bus.
pub async fn send_notification(summary: &str, body: &str, urgency: Urgency) -> Result<(), String> {
    let connection = Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session bus: {}", e))?;

    let proxy = NotificationsProxy::new(&connection)
        .await
        .map_err(|e| format!("Failed to create notifications proxy: {}", e))?;

    let mut hints = HashMap::new();
    hints.insert("urgency", zbus::zvariant::Value::U8(urgency.level()));

    proxy
        .notify(
            "wayshare",
            0,
            urgency.icon(),
            summary,
            body,
            vec![],
            hints,
            EXPIRE_TIMEOUT_MS,
        )
        .await
        .map_err(|e| format!("Failed to send notification: {}", e))?;

    Ok(())
}
