//! claire-api: Client for the CLAIRE assistant service
//!
//! This crate provides the wire types for the service's health and chat
//! endpoints, plus the [`ServiceApi`] trait and its HTTP implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiConfig, HttpServiceApi, ServiceApi};
pub use error::{Error, Result};
pub use types::*;
