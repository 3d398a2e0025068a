//! # Authentication Module
//!
//! Authenticated API client subsystem for the show tracker core.
//!
//! ## Overview
//!
//! This crate owns the credential lifecycle for the tracking API: persisting
//! the access/refresh token pair, attaching the access token to outgoing
//! requests, detecting authentication challenges, and coordinating the
//! single-flight token refresh that answers them.
//!
//! ## Components
//!
//! - [`CredentialStore`]: durable token persistence with a synchronously
//!   readable in-memory copy
//! - [`TokenClient`]: authorization-code and refresh-token exchange against
//!   the token endpoint
//! - [`Authenticator`]: the challenge handler; at most one refresh in flight,
//!   all challenged requests share its outcome
//! - [`AuthHttpClient`]: request facade composing the interceptor pipeline,
//!   transport, and challenge handling
//! - [`SessionManager`]: sign-in completion, sign-out, session state
//!
//! ## Guarantees
//!
//! - With any number of requests failing authentication concurrently, exactly
//!   one refresh call reaches the token endpoint.
//! - A request is resubmitted at most once; a second challenge surfaces as
//!   [`AuthError::RetryExhausted`].
//! - A rejected refresh token erases stored credentials and surfaces
//!   [`AuthError::RefreshTerminal`]; transient refresh failures leave the
//!   stored pair intact and are retryable.
//! - Callers never see an unclassified lower-level error.

pub mod authenticator;
pub mod client;
pub mod error;
pub mod interceptor;
pub mod refresher;
pub mod session;
pub mod store;
pub mod types;

pub use authenticator::Authenticator;
pub use client::AuthHttpClient;
pub use error::{AuthError, Result};
pub use interceptor::{AuthInterceptor, Interceptor, StaticHeaders};
pub use refresher::TokenClient;
pub use session::SessionManager;
pub use store::CredentialStore;
pub use types::{AuthState, Credentials};
