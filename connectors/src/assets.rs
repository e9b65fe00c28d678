//! Marketplace-backed asset provider.

use async_trait::async_trait;
use serde::Deserialize;

use tokengate_engine::{AssetProvider, ProviderError};
use tokengate_types::{AssetHolding, FieldMatch, SubjectId, WalletAddress};

use crate::{status_err, transport_err};

/// Asset lookups against the marketplace data API.
///
/// Endpoints:
/// - `GET /wallets/{address}/holdings` -> `[AssetHolding]`
/// - `GET /wallets/{address}/count?collection=..&attribute_key=..&attribute_value=..&limit=..` -> `{ "count": n }`
/// - `GET /subjects/{subject}/wallets` -> `[address]`
pub struct HttpAssetProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl HttpAssetProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let req = self.client.get(url);
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    fn count_url(
        &self,
        address: &WalletAddress,
        collection: &FieldMatch,
        attribute: Option<(&str, &str)>,
        min_items_hint: Option<u32>,
    ) -> String {
        let mut url = format!("{}/wallets/{}/count", self.base_url, address.as_str());
        let mut params: Vec<(&str, String)> = Vec::new();
        if let FieldMatch::Exact(slug) = collection {
            params.push(("collection", slug.clone()));
        }
        if let Some((key, value)) = attribute {
            params.push(("attribute_key", key.to_string()));
            params.push(("attribute_value", value.to_string()));
        }
        if let Some(hint) = min_items_hint {
            params.push(("limit", hint.to_string()));
        }
        for (i, (name, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(name);
            url.push('=');
            url.push_str(value);
        }
        url
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

#[async_trait]
impl AssetProvider for HttpAssetProvider {
    async fn count_matching(
        &self,
        address: &WalletAddress,
        collection: &FieldMatch,
        attribute: Option<(&str, &str)>,
        min_items_hint: Option<u32>,
    ) -> Result<u64, ProviderError> {
        let url = self.count_url(address, collection, attribute, min_items_hint);
        let response = self.get(url).send().await.map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("holdings count", response.status()));
        }
        let body: CountResponse = response.json().await.map_err(transport_err)?;
        Ok(body.count)
    }

    async fn snapshot(&self, address: &WalletAddress) -> Result<Vec<AssetHolding>, ProviderError> {
        let url = format!("{}/wallets/{}/holdings", self.base_url, address.as_str());
        let response = self.get(url).send().await.map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("holdings snapshot", response.status()));
        }
        response.json().await.map_err(transport_err)
    }

    async fn addresses_for(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<WalletAddress>, ProviderError> {
        let url = format!("{}/subjects/{}/wallets", self.base_url, subject.as_str());
        let response = self.get(url).send().await.map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("linked wallets", response.status()));
        }
        response.json().await.map_err(transport_err)
    }
}
