//! Core types and trait definitions for the organizations directory.
//!
//! This crate is free of HTTP and database dependencies. It holds the
//! activity hierarchy engine, the location-search translator, and the
//! [`store::DirectoryStore`] abstraction every backend implements.

#![allow(async_fn_in_trait)]

pub mod activity;
pub mod building;
pub mod error;
pub mod location;
pub mod organization;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
