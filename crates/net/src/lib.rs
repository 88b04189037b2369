#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for hotswap
//!
//! This crate talks to the update server: the update check and the package
//! download. The sync coordinator only sees the [`UpdateClient`] trait.

mod client;
mod update;

pub use client::{NetClient, NetConfig};
pub use update::{HttpUpdateClient, UpdateClient, UpdateQuery};
