//! # rpl-common-core
//!
//! Core types for the RPL runtime that are `no_std` compatible.
//!
//! This crate provides foundational types used by the runtime:
//! - `TypeId` - Object type tags stored in front of every heap object
//! - `Base` - Radix of based integers
//! - `leb128` - Variable-length integer codec used by object payloads
//! - `Settings` - Display and precision settings read by the numeric code

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod leb128;
pub mod settings;
pub mod types;

pub use settings::{DisplayMode, Settings};
pub use types::{Base, TypeId, FIRST_USER_TYPE_ID};
