//! # Blackboard Learn Integration Library
//!
//! A Blackboard Learn REST API client with:
//! - OAuth2 client-credentials authentication with a shared, lazily-refreshed
//!   access token (one token exchange at a time, no matter how many callers)
//! - A durable token cache so restarts don't cost an exchange
//! - Typed services for users, courses, enrollments, and announcements
//! - Rate-limit introspection via the `X-Rate-Limit-Remaining` header
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_blackboard::{Availability, BlackboardClient, CourseRole};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BlackboardClient::builder()
//!         .base_url("https://learn.example.edu")
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .build()
//!         .await?;
//!
//!     // Enroll a student; the access token is obtained and cached lazily.
//!     client
//!         .courses()
//!         .enroll_user("CS101", "jdoe", CourseRole::Student, Availability::Yes)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Known limitation
//!
//! A token can expire in the window between its usability check and the
//! server evaluating the request; such a request surfaces the server's 401
//! rather than being retried. Callers that need stronger guarantees should
//! retry at their own layer.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;

// Authentication
pub mod auth;

// HTTP client and dispatcher
pub mod client;

// API services
pub mod services;

// Re-exports for convenience
pub use auth::{ClientCredentials, FileTokenStore, MemoryTokenStore, Token, TokenAuthority, TokenStore};
pub use client::{BlackboardClient, BlackboardClientBuilder};
pub use config::{BlackboardConfig, BlackboardConfigBuilder};
pub use errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
pub use services::{
    Announcement, AnnouncementsService, Availability, Course, CourseRole, CoursesService,
    EnrollmentRequest, NewUser, Paged, User, UserUpdate, UsersService,
};
