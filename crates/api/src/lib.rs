#![forbid(unsafe_code)]

mod ops;
mod server;
mod support;

pub use server::{ApiRequest, ApiServer, error_response, response};
