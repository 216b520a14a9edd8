//! Storefront REST API: request client, typed accessors and wire types.
//!
//! Accessors are `impl ApiClient` blocks, one module per resource family.
//! Each one maps a typed call onto exactly one request; they neither retry
//! nor cache.

mod analytics;
mod auth;
pub mod client;
mod customers;
mod orders;
pub mod params;
mod products;
pub mod types;

pub use client::{ApiClient, RequestOptions};

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
  // byte_serialize writes spaces as '+'; a literal '+' is already %2B
  url::form_urlencoded::byte_serialize(value.as_bytes())
    .collect::<String>()
    .replace('+', "%20")
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_segment_encoding() {
    assert_eq!(segment("7290000000001"), "7290000000001");
    assert_eq!(segment("a b/c"), "a%20b%2Fc");
    assert_eq!(segment("1+1"), "1%2B1");
  }
}
