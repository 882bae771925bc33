//! Target resolution for the two accepted request shapes
//!
//! Clients reach the upstream either through the fixed gateway route
//! (`/api/proxy?path=/web_services/...`) or by hitting a `/web_services/...`
//! path directly. Both collapse into one [`TargetRoute`] here, so the two
//! shapes cannot drift apart in validation or URL construction.

use std::collections::BTreeMap;

use reqwest::Url;

use super::error::RelayError;

/// Paths relayed upstream must live under this prefix
pub const REQUIRED_PREFIX: &str = "/web_services/";

/// Inbound route for the query-encoded shape
pub const GATEWAY_ROUTE: &str = "/api/proxy";

/// Where a relayed request goes, resolved from the inbound shape
#[derive(Debug, Clone, PartialEq)]
pub enum TargetRoute {
    /// Target path carried in the `path` query parameter; remaining
    /// params are forwarded with the designator stripped
    QueryEncoded {
        path: String,
        params: BTreeMap<String, String>,
    },
    /// Inbound path already lives under /web_services/; path and params
    /// are forwarded as-is
    Direct {
        path: String,
        params: BTreeMap<String, String>,
    },
}

impl TargetRoute {
    /// Resolve an inbound path + query map into a target, or reject.
    ///
    /// Rejections never reach the upstream: unrecognized inbound paths are
    /// `InvalidPath`, recognized ones whose target escapes the
    /// /web_services/ namespace are `PrefixViolation`.
    pub fn resolve(
        inbound_path: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<Self, RelayError> {
        if inbound_path == GATEWAY_ROUTE {
            let path = params.remove("path").unwrap_or_default();
            if !path.starts_with(REQUIRED_PREFIX) {
                return Err(RelayError::PrefixViolation);
            }
            Ok(TargetRoute::QueryEncoded { path, params })
        } else if inbound_path.starts_with(REQUIRED_PREFIX) {
            Ok(TargetRoute::Direct {
                path: inbound_path.to_string(),
                params,
            })
        } else {
            Err(RelayError::InvalidPath)
        }
    }

    /// The upstream path this target resolves to
    pub fn path(&self) -> &str {
        match self {
            TargetRoute::QueryEncoded { path, .. } => path,
            TargetRoute::Direct { path, .. } => path,
        }
    }

    /// Forwarded query parameters (designator already stripped)
    pub fn params(&self) -> &BTreeMap<String, String> {
        match self {
            TargetRoute::QueryEncoded { params, .. } => params,
            TargetRoute::Direct { params, .. } => params,
        }
    }

    /// Build the absolute upstream URL: base + path + re-serialized params.
    ///
    /// No `?` is emitted when no params survive. Key order follows the
    /// map, not the inbound wire order.
    pub fn url(&self, upstream: &Url) -> Url {
        let mut url = upstream.clone();
        url.set_path(self.path());
        if !self.params().is_empty() {
            url.query_pairs_mut().extend_pairs(self.params());
        }
        url
    }
}
