//! In-app notifications: a background unread-count poller, the on-demand list,
//! and optimistic read marking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::client::{ApiClient, ClientResult};
use crate::models::Notification;
use crate::pagination::Paginated;
use crate::routes::notifications::{ListNotifications, MarkedRead, UnreadCount};

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub async fn unread_count(client: &ApiClient) -> ClientResult<i64> {
    let reply: UnreadCount = client.get("/notifications/unread-count").await?;
    Ok(reply.count)
}

pub async fn list(
    client: &ApiClient,
    params: &ListNotifications,
) -> ClientResult<Paginated<Notification>> {
    client.get_page("/notifications", params).await
}

pub async fn mark_read(client: &ApiClient, id: Uuid) -> ClientResult<Notification> {
    client.put_empty(&format!("/notifications/{id}/read")).await
}

pub async fn mark_all_read(client: &ApiClient) -> ClientResult<u64> {
    let reply: MarkedRead = client.put_empty("/notifications/read-all").await?;
    Ok(reply.updated)
}

pub async fn delete(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/notifications/{id}")).await
}

/// Local notification state shared between the poller and the UI.
pub struct NotificationCenter {
    client: ApiClient,
    interval: Duration,
    unread: watch::Sender<i64>,
    items: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new(client: ApiClient) -> Arc<Self> {
        Self::with_interval(client, POLL_INTERVAL)
    }

    pub fn with_interval(client: ApiClient, interval: Duration) -> Arc<Self> {
        let (unread, _) = watch::channel(0);
        Arc::new(Self {
            client,
            interval,
            unread,
            items: RwLock::new(Vec::new()),
        })
    }

    /// Receives every change of the unread count.
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.unread.subscribe()
    }

    pub fn unread(&self) -> i64 {
        *self.unread.borrow()
    }

    pub async fn refresh_count(&self) -> ClientResult<i64> {
        let count = unread_count(&self.client).await?;
        self.unread.send_replace(count);
        Ok(count)
    }

    /// Poll the unread count until `shutdown` flips to true. The first tick fires immediately.
    pub fn spawn_poller(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let center = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(center.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = center.refresh_count().await {
                            tracing::debug!("Unread count poll failed: {e}");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                if *shutdown.borrow() {
                    break;
                }
            }
            tracing::debug!("Notification poller stopped");
        })
    }

    /// Fetch a page of notifications and keep it as the local list.
    pub async fn load(&self, params: &ListNotifications) -> ClientResult<Paginated<Notification>> {
        let page = list(&self.client, params).await?;
        *self.items.write().await = page.data.clone();
        Ok(page)
    }

    pub async fn items(&self) -> Vec<Notification> {
        self.items.read().await.clone()
    }

    /// Marks locally first; a failed request is logged and the local change kept.
    pub async fn mark_read(&self, id: Uuid) {
        let was_unread = {
            let mut items = self.items.write().await;
            match items.iter_mut().find(|n| n.id == id) {
                Some(n) if !n.is_read => {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                    true
                }
                _ => false,
            }
        };
        if was_unread {
            self.unread.send_modify(|count| *count = (*count - 1).max(0));
        }

        if let Err(e) = mark_read(&self.client, id).await {
            tracing::warn!("Failed to mark notification {id} as read: {e}");
        }
    }

    pub async fn mark_all_read(&self) {
        {
            let now = Utc::now();
            let mut items = self.items.write().await;
            for n in items.iter_mut().filter(|n| !n.is_read) {
                n.is_read = true;
                n.read_at = Some(now);
            }
        }
        self.unread.send_replace(0);

        if let Err(e) = mark_all_read(&self.client).await {
            tracing::warn!("Failed to mark notifications as read: {e}");
        }
    }

    pub async fn delete(&self, id: Uuid) -> ClientResult<()> {
        delete(&self.client, id).await?;
        let mut items = self.items.write().await;
        if let Some(pos) = items.iter().position(|n| n.id == id) {
            let removed = items.remove(pos);
            if !removed.is_read {
                self.unread.send_modify(|count| *count = (*count - 1).max(0));
            }
        }
        Ok(())
    }
}
