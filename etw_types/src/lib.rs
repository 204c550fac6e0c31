// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![no_std]
#![warn(missing_docs)]
#![allow(clippy::needless_return)]

//! Types shared by producers and consumers of ETW event records: the provider
//! [`Guid`], the event identity [`EventKey`], the record's [`PointerWidth`],
//! and the post-parsed [`RecordContext`] that accompanies each payload.

pub use descriptors::EventKey;
pub use descriptors::RecordContext;
pub use guid::Guid;
pub use pointer_width::PointerWidth;

pub mod changelog;

mod descriptors;
mod guid;
mod pointer_width;
