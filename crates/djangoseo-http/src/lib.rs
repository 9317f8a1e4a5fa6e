//! # djangoseo-http
//!
//! HTTP layer for djangoseo-rs. Provides the [`HttpRequest`] and [`HttpResponse`]
//! types the redirect middleware operates on, plus constructors for the terminal
//! responses it produces (301 and 410).

pub mod request;
pub mod response;

pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{
    HttpResponse, HttpResponseGone, HttpResponseNotFound, HttpResponsePermanentRedirect,
    ResponseContent,
};
