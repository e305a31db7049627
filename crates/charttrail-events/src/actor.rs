//! Actor and network context capture.
//!
//! Context capture is centralized here so callers cannot forget it: the
//! builder takes a `RequestContext` once and every event it produces
//! carries the same actor fields.

use std::collections::BTreeMap;
use std::net::IpAddr;

use charttrail_contracts::ActorContext;

/// Proxy headers consulted for the client address, in priority order.
/// The first header carrying a valid IP wins; `x-forwarded-for` may hold a
/// comma-separated hop list, of which the first valid entry is taken.
const PROXY_IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Per-request context the business layer hands to the event builder.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
    /// The direct peer address, used when no proxy header yields an IP.
    pub peer_addr: Option<String>,
    /// Request headers, matched case-insensitively.
    headers: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request header.  Keys are stored lower-cased.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_peer(mut self, peer_addr: impl Into<String>) -> Self {
        self.peer_addr = Some(peer_addr.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// The client IP: first valid address from the proxy headers, falling
    /// back to the direct peer.  Invalid or spoofed-looking values are
    /// skipped rather than recorded.
    pub fn client_ip(&self) -> Option<String> {
        for header in PROXY_IP_HEADERS {
            let Some(value) = self.headers.get(header) else {
                continue;
            };
            for candidate in value.split(',') {
                let candidate = candidate.trim();
                if candidate.parse::<IpAddr>().is_ok() {
                    return Some(candidate.to_string());
                }
            }
        }
        self.peer_addr
            .as_deref()
            .filter(|peer| peer.parse::<IpAddr>().is_ok())
            .map(str::to_string)
    }

    /// The actor fields this request resolves to.
    pub fn actor(&self) -> ActorContext {
        ActorContext {
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
            ip_address: self.client_ip(),
            user_agent: self.user_agent.clone(),
        }
    }
}
