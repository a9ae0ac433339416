//! Types shared between the console core and the query backend's JSON API.

pub mod domain;
pub mod error;
pub mod protocol;
