//! The chat platform's role management REST API.

use async_trait::async_trait;
use serde::Deserialize;

use tokengate_engine::{AssignOutcome, PlatformRoleApi, ProviderError};
use tokengate_types::{RoleId, ServerId, SubjectId};

use crate::{status_err, transport_err};

/// Role management calls.
///
/// Endpoints:
/// - `PUT    /servers/{server}/members/{subject}/roles/{role}` -> `{ "alreadyHeld": bool }`
/// - `DELETE /servers/{server}/members/{subject}/roles/{role}` -> `{ "removed": bool }`
/// - `GET    /servers/{server}/members/{subject}` -> 200 member / 404 not a member
pub struct RestPlatformApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignResponse {
    already_held: bool,
}

#[derive(Deserialize)]
struct RevokeResponse {
    removed: bool,
}

impl RestPlatformApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn role_url(&self, subject: &SubjectId, role: &RoleId, server: &ServerId) -> String {
        format!(
            "{}/servers/{}/members/{}/roles/{}",
            self.base_url,
            server.as_str(),
            subject.as_str(),
            role.as_str()
        )
    }

    fn member_url(&self, subject: &SubjectId, server: &ServerId) -> String {
        format!(
            "{}/servers/{}/members/{}",
            self.base_url,
            server.as_str(),
            subject.as_str()
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
    }
}

#[async_trait]
impl PlatformRoleApi for RestPlatformApi {
    async fn assign(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        server: &ServerId,
    ) -> Result<AssignOutcome, ProviderError> {
        let url = self.role_url(subject, role, server);
        let response = self
            .authed(self.client.put(url))
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("role assign", response.status()));
        }
        let body: AssignResponse = response.json().await.map_err(transport_err)?;
        Ok(AssignOutcome {
            already_held: body.already_held,
        })
    }

    async fn revoke(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        server: &ServerId,
    ) -> Result<bool, ProviderError> {
        let url = self.role_url(subject, role, server);
        let response = self
            .authed(self.client.delete(url))
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("role revoke", response.status()));
        }
        let body: RevokeResponse = response.json().await.map_err(transport_err)?;
        Ok(body.removed)
    }

    async fn is_member(
        &self,
        subject: &SubjectId,
        server: &ServerId,
    ) -> Result<bool, ProviderError> {
        let url = self.member_url(subject, server);
        let response = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(transport_err)?;
        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_err("membership check", status)),
        }
    }
}
