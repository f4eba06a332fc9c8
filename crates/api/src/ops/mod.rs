#![forbid(unsafe_code)]

mod batches;
mod templates;
mod views;

pub(crate) use batches::*;
pub(crate) use templates::*;
pub(crate) use views::*;

use lt_storage::StoreError;

pub(crate) enum OpError {
    Params(String),
    Store(StoreError),
}

impl From<StoreError> for OpError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<String> for OpError {
    fn from(value: String) -> Self {
        Self::Params(value)
    }
}
