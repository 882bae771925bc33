//! HTTP forwarding gateway
//!
//! Accepts browser requests, checks the shared secret, restricts targets
//! to the upstream's `/web_services/` namespace, and relays to the fixed
//! partner origin. Split into:
//! - `server`: state, router assembly, bind/serve lifecycle
//! - `relay`: the authorize -> resolve -> dispatch -> pass-through path
//! - `target`: the two accepted request shapes and URL construction
//! - `cors`: permissive headers plus preflight short-circuit
//! - `status`: unauthenticated health and outbound-IP endpoints
//! - `error`: the local error taxonomy and its JSON envelope

pub mod cors;
pub mod error;
pub mod relay;
pub mod server;
pub mod status;
pub mod target;

pub use error::RelayError;
pub use server::{router, start_proxy, ProxyState};
pub use target::{TargetRoute, GATEWAY_ROUTE, REQUIRED_PREFIX};
