//! Application constants
//!
//! Centralized location for the endpoint paths, header names and request
//! defaults shared by the client crates.

// Auth endpoints
pub const AUTH_LOGIN_PATH: &str = "/auth/login";
pub const AUTH_SIGNUP_PATH: &str = "/auth/signup";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "/auth/logout";
pub const AUTH_LOGOUT_ALL_PATH: &str = "/auth/logout-all";

// Auth-mutation endpoints where a 401 must never trigger a session refresh
pub const NO_REFRESH_PATHS: [&str; 5] = [
    AUTH_LOGIN_PATH,
    AUTH_SIGNUP_PATH,
    AUTH_REFRESH_PATH,
    AUTH_LOGOUT_PATH,
    AUTH_LOGOUT_ALL_PATH,
];

// CSRF protection
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const CSRF_COOKIE_PREFIX: &str = "csrf";
pub const CSRF_TOKEN_PATH: &str = "/auth/csrf";

// Request defaults
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const HEALTH_PATH: &str = "/health";
