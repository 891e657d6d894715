//! Protocol bindings shared between the provisioning engine and the parts of
//! the server that call into it. These are the types that cross a boundary:
//! error values that surface to a caller, and cache flush requests that an
//! administrator issues.

#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

pub mod attribute;
pub mod constants;
pub mod internal;
