//! Extractors whose rejections go through [`ServerError`], so malformed
//! bodies, query strings and paths get the same `{"error": ...}` response as
//! every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ServerError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct AppPath<T>(pub T);
