#![allow(unused_imports)]

//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` work.

pub mod api_key;
pub mod integration_log;
pub mod lead;
pub mod profile;
pub mod setting;

pub use self::api_key::*;
pub use self::integration_log::*;
pub use self::lead::*;
pub use self::profile::*;
pub use self::setting::*;
