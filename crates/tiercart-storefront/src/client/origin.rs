//! Store URL handling for the Storefront client.

use reqwest::Url;

use crate::error::GatewayError;

/// Extracts the scheme+host origin from a store URL.
///
/// Given `"https://shop.example.com/collections/all"`, returns
/// `"https://shop.example.com"`. The Storefront API always lives at the
/// store root, whatever path the configured URL carries.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidStoreUrl`] if the URL cannot be parsed or
/// has no host.
pub fn extract_store_origin(store_url: &str) -> Result<String, GatewayError> {
    let url = Url::parse(store_url.trim()).map_err(|e| GatewayError::InvalidStoreUrl {
        store_url: store_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(GatewayError::InvalidStoreUrl {
            store_url: store_url.to_owned(),
            reason: "URL has no host".to_owned(),
        });
    }
    Ok(url.origin().ascii_serialization())
}

/// Builds `{origin}/api/{version}/graphql.json`.
pub(super) fn graphql_endpoint(store_url: &str, api_version: &str) -> Result<Url, GatewayError> {
    let origin = extract_store_origin(store_url)?;
    let version = api_version.trim().trim_matches('/');
    if version.is_empty() {
        return Err(GatewayError::InvalidStoreUrl {
            store_url: store_url.to_owned(),
            reason: "storefront API version is empty".to_owned(),
        });
    }
    let endpoint = format!("{origin}/api/{version}/graphql.json");
    Url::parse(&endpoint).map_err(|e| GatewayError::InvalidStoreUrl {
        store_url: store_url.to_owned(),
        reason: format!("endpoint \"{endpoint}\" is not a valid URL: {e}"),
    })
}
