//! Gateway prefixes and auth endpoint paths
//!
//! Every backend microservice sits behind the gateway under its own prefix.
//! Paths here are relative to the configured API base URL.

/// User center service (accounts, roles, auth)
pub const SERVICE_USERCENTER: &str = "/usercenter";

/// Base service (dictionaries, system config)
pub const SERVICE_BASE: &str = "/base";

pub const LOGIN_PATH: &str = "/usercenter/auth/login";

pub const LOGOUT_PATH: &str = "/usercenter/auth/logout";

/// Default refresh endpoint. A 401 from this path is terminal.
pub const REFRESH_PATH: &str = "/usercenter/auth/refresh";

/// Scheme prefix for the Authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";
