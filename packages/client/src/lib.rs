// ABOUTME: REST client for the Dealflow deals API
// ABOUTME: Defines the DealApi trait, the reqwest-backed implementation, and the API error taxonomy

pub mod api;
mod envelope;
pub mod error;
pub mod http;

pub use api::{DealApi, DealPage, ListDealsQuery};
pub use error::{ApiError, ApiResult, ValidationIssue};
pub use http::HttpDealApi;
