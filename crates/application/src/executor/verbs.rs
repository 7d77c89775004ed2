//! Verb helpers over [`RequestExecutor::execute`].

use courtyard_domain::{
    HttpMethod, QueryParams, RequestBody, RequestDescriptor, RequestResult, ResponseEnvelope,
};

use super::RequestExecutor;
use crate::ports::HttpTransport;

impl<T: HttpTransport> RequestExecutor<T> {
    /// `GET path?query`. Absent query values are never sent.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn get(&self, path: &str, query: QueryParams) -> RequestResult<ResponseEnvelope> {
        self.execute(RequestDescriptor::get(path).with_query(query))
            .await
    }

    /// `POST path` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody> + Send,
    ) -> RequestResult<ResponseEnvelope> {
        self.execute(with_body(HttpMethod::Post, path, body)).await
    }

    /// `PUT path` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody> + Send,
    ) -> RequestResult<ResponseEnvelope> {
        self.execute(with_body(HttpMethod::Put, path, body)).await
    }

    /// `PATCH path` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<RequestBody> + Send,
    ) -> RequestResult<ResponseEnvelope> {
        self.execute(with_body(HttpMethod::Patch, path, body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn delete(&self, path: &str) -> RequestResult<ResponseEnvelope> {
        self.execute(RequestDescriptor::new(HttpMethod::Delete, path))
            .await
    }
}

fn with_body(method: HttpMethod, path: &str, body: impl Into<RequestBody>) -> RequestDescriptor {
    RequestDescriptor::new(method, path).with_body(body.into())
}
