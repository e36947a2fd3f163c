//! Outbound HTTP helper
//!
//! One call issues one request and returns a [`Response`] whose body is
//! parsed JSON when possible and raw text otherwise. Transport failures are
//! surfaced as [`HttpError`]; body parse failures never are.
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolbelt::config::HttpConfig;
//! use toolbelt::http::{HttpClient, RequestOptions};
//!
//! let client = HttpClient::new(&HttpConfig::default())?;
//! let response = client
//!     .get("http://example.test/a", RequestOptions::new().param("page", "2"))
//!     .await?;
//! println!("{} {:?}", response.status, response.body);
//! ```

mod body;
mod client;
mod error;
mod types;

pub use body::{is_json_media_type, parse_body};
pub use client::HttpClient;
pub use error::{HttpError, Result};
pub use types::{Body, HeadersMap, Method, Request, RequestOptions, Response, ResponseBody};
