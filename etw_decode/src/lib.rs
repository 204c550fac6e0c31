// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![warn(missing_docs)]
#![allow(clippy::needless_return)]

//! Lazy, schema-driven decoding of ETW event payloads.
//!
//! An [`EventSchema`] lists an event's fields in payload order. An
//! [`EventView`] binds a schema to one record's payload and decodes fields on
//! request, computing and caching field offsets only as far as needed.
//!
//! ```
//! use etw_decode::schema_tables;
//! use etw_decode::EventView;
//! use etw_types::PointerWidth;
//! use etw_types::RecordContext;
//!
//! let mut payload = Vec::new();
//! payload.extend_from_slice(&0x7ff6_1234_0000u64.to_le_bytes()); // InstructionPointer
//! payload.extend_from_slice(&42u32.to_le_bytes()); // ThreadId
//! payload.extend_from_slice(&1u16.to_le_bytes()); // Count
//! payload.extend_from_slice(&0u16.to_le_bytes()); // Reserved
//!
//! let context = RecordContext::new(PointerWidth::Bits64);
//! let view = EventView::new(&schema_tables::SAMPLE_PROF_V2, context, &payload);
//! let thread_id = view.field_index("ThreadId").unwrap();
//! assert_eq!(42, view.u32(thread_id).unwrap());
//! assert_eq!(0x7ff6_1234_0000, view.pointer(0).unwrap());
//! ```

pub use array_view::ArrayIter;
pub use array_view::ArrayView;
pub use array_view::ElementValue;
pub use byte_reader::PayloadReader;
pub use decode_options::DecodeOptions;
pub use error::DecodeError;
pub use error::SchemaError;
pub use event_view::EventView;
pub use field_schema::ArrayCount;
pub use field_schema::ElementType;
pub use field_schema::EventSchema;
pub use field_schema::FieldDesc;
pub use field_schema::FieldKind;
pub use field_schema::ScalarType;
pub use field_schema::SchemaKey;
pub use field_value::FieldValue;
pub use schema_tables::SchemaTable;

pub mod changelog;
pub mod schema_tables;

mod array_view;
mod byte_reader;
mod charconv;
mod decode_options;
mod error;
mod event_view;
mod field_schema;
mod field_value;
mod offset_cache;
