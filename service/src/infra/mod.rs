//! Infrastructure layer.

pub mod api;
pub mod http;
pub mod navigation;
pub mod storage;

pub use self::{
    api::Api,
    navigation::Navigator,
    storage::{Storage, Store, TokenStore},
};
