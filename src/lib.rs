//! Client-side data synchronization for a storefront management API.
//!
//! - [`api`]: REST client and one typed accessor per endpoint
//! - [`cache`]: cache-coordinated queries, pagination and optimistic mutations
//! - [`session`]: authentication, tenant selection and refresh epochs
//! - [`sync`]: the [`Storefront`] facade tying the three together

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;
pub mod sync;

pub use error::{ApiError, StorageError};
pub use sync::Storefront;
