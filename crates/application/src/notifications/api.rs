//! Typed wrappers over the notification routes.

use std::sync::Arc;

use async_trait::async_trait;
use courtyard_domain::{
    DomainError, HttpMethod, Notification, QueryParams, RequestBody, RequestDescriptor,
    RequestFailure, RequestResult, UnreadCount,
};
use serde::Serialize;

use crate::executor::RequestExecutor;
use crate::ports::{HttpTransport, NotificationFeed};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushTokenPayload<'a> {
    push_token: &'a str,
}

/// Client for `/notifications/*`.
pub struct NotificationApi<T: HttpTransport> {
    executor: Arc<RequestExecutor<T>>,
}

impl<T: HttpTransport> Clone for NotificationApi<T> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<T: HttpTransport> NotificationApi<T> {
    /// Wraps a shared executor.
    pub const fn new(executor: Arc<RequestExecutor<T>>) -> Self {
        Self { executor }
    }

    /// `GET /notifications?page&limit`.
    ///
    /// # Errors
    ///
    /// Any classified executor failure.
    pub async fn list(&self, page: u32, limit: Option<u32>) -> RequestResult<Vec<Notification>> {
        self.executor
            .execute_as(RequestDescriptor::get("/notifications").with_query(paging(page, limit)))
            .await
    }

    /// `GET /notifications/announcements?page&limit`.
    ///
    /// # Errors
    ///
    /// Any classified executor failure.
    pub async fn announcements(
        &self,
        page: u32,
        limit: Option<u32>,
    ) -> RequestResult<Vec<Notification>> {
        self.executor
            .execute_as(
                RequestDescriptor::get("/notifications/announcements")
                    .with_query(paging(page, limit)),
            )
            .await
    }

    /// `GET /notifications/unread-count`.
    ///
    /// # Errors
    ///
    /// Any classified executor failure.
    pub async fn unread_count(&self) -> RequestResult<u64> {
        let unread: UnreadCount = self
            .executor
            .execute_as(RequestDescriptor::get("/notifications/unread-count"))
            .await?;
        Ok(unread.count)
    }

    /// `PUT /notifications/:id/read`.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` for an unusable id, otherwise any executor failure.
    pub async fn mark_read(&self, id: &str) -> RequestResult<()> {
        let id = checked_id(id)?;
        self.executor
            .execute_ack(RequestDescriptor::new(
                HttpMethod::Put,
                format!("/notifications/{id}/read"),
            ))
            .await
    }

    /// `PUT /notifications/read-all`.
    ///
    /// # Errors
    ///
    /// Any classified executor failure.
    pub async fn mark_all_read(&self) -> RequestResult<()> {
        self.executor
            .execute_ack(RequestDescriptor::new(
                HttpMethod::Put,
                "/notifications/read-all",
            ))
            .await
    }

    /// `DELETE /notifications/:id`.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` for an unusable id, otherwise any executor failure.
    pub async fn delete(&self, id: &str) -> RequestResult<()> {
        let id = checked_id(id)?;
        self.executor
            .execute_ack(RequestDescriptor::new(
                HttpMethod::Delete,
                format!("/notifications/{id}"),
            ))
            .await
    }

    /// `POST /notifications/register-token` with `{ pushToken }`.
    ///
    /// # Errors
    ///
    /// Any classified executor failure.
    pub async fn register_push_token(&self, token: &str) -> RequestResult<()> {
        let body = RequestBody::json(&PushTokenPayload { push_token: token })
            .map_err(|e| RequestFailure::validation(e.to_string(), Vec::new()))?;
        self.executor
            .execute_ack(
                RequestDescriptor::new(HttpMethod::Post, "/notifications/register-token")
                    .with_body(body),
            )
            .await
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> NotificationFeed for NotificationApi<T> {
    async fn notifications(&self, page: u32, limit: u32) -> RequestResult<Vec<Notification>> {
        self.list(page, Some(limit)).await
    }

    async fn announcements(&self, page: u32, limit: u32) -> RequestResult<Vec<Notification>> {
        Self::announcements(self, page, Some(limit)).await
    }

    async fn unread_count(&self) -> RequestResult<u64> {
        Self::unread_count(self).await
    }

    async fn register_push_token(&self, token: &str) -> RequestResult<()> {
        Self::register_push_token(self, token).await
    }
}

fn paging(page: u32, limit: Option<u32>) -> QueryParams {
    QueryParams::new().with("page", page).with_opt("limit", limit)
}

fn checked_id(id: &str) -> Result<&str, DomainError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) || id.contains(char::is_whitespace) {
        return Err(DomainError::InvalidPath(format!(
            "`{id}` is not a notification id"
        )));
    }
    Ok(id)
}
