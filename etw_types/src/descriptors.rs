// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::Guid;
use crate::PointerWidth;

/// Identity of an ETW event: which provider logged it and which of the
/// provider's event definitions it follows.
///
/// A record demultiplexer uses the key to find the schema for the payload.
/// For manifest-based providers the `(provider_id, event_id, version)` triple
/// identifies the definition. For classic (MOF) kernel events `event_id` is 0
/// and the definition is identified by `(provider_id, opcode, version)`, where
/// `provider_id` is the event's class GUID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventKey {
    /// Provider (or classic event class) GUID.
    pub provider_id: Guid,

    /// Manifest event id, or 0 for classic events.
    pub event_id: u16,

    /// Version of the event definition. Incremented by the provider for each
    /// change to the payload layout.
    pub version: u8,

    /// Opcode, e.g. 1 = start, 2 = stop, or a provider-defined value.
    pub opcode: u8,

    /// Provider-defined task.
    pub task: u16,

    /// Keyword bits used for filtering.
    pub keyword: u64,

    /// Severity level: 1=critical, 2=error, 3=warning, 4=info, 5=verbose.
    pub level: u8,
}

impl EventKey {
    /// Creates a new key from values.
    pub const fn from_parts(
        provider_id: Guid,
        event_id: u16,
        version: u8,
        opcode: u8,
        task: u16,
        keyword: u64,
        level: u8,
    ) -> EventKey {
        return EventKey {
            provider_id,
            event_id,
            version,
            opcode,
            task,
            keyword,
            level,
        };
    }
}

/// Metadata about a single record, parsed from the record's common header by
/// the record reader and handed to the decoder alongside the payload.
///
/// The decoder only needs `pointer_width`. The remaining values are carried for
/// consumers that want them next to decoded fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordContext {
    /// Id of the process that logged the event.
    pub process_id: u32,

    /// Id of the thread that logged the event.
    pub thread_id: u32,

    /// Timestamp from the record header, in the session's clock units.
    pub timestamp: i64,

    /// Processor on which the event was logged.
    pub processor_number: u8,

    /// Size of address-sized payload fields.
    pub pointer_width: PointerWidth,

    /// Kernel-mode CPU time of the thread, if the session recorded it.
    pub kernel_time: Option<u64>,

    /// User-mode CPU time of the thread, if the session recorded it.
    pub user_time: Option<u64>,

    /// Processor time, for sessions that record it instead of kernel/user time.
    pub processor_time: Option<u64>,
}

impl RecordContext {
    /// Creates a context with the given pointer width and all other values
    /// zero or `None`.
    pub const fn new(pointer_width: PointerWidth) -> Self {
        return Self {
            process_id: 0,
            thread_id: 0,
            timestamp: 0,
            processor_number: 0,
            pointer_width,
            kernel_time: None,
            user_time: None,
            processor_time: None,
        };
    }

    /// Returns a copy with process and thread ids set.
    pub const fn with_ids(self, process_id: u32, thread_id: u32) -> Self {
        return Self {
            process_id,
            thread_id,
            ..self
        };
    }

    /// Returns a copy with the timestamp set.
    pub const fn with_timestamp(self, timestamp: i64) -> Self {
        return Self { timestamp, ..self };
    }

    /// Returns a copy with the processor number set.
    pub const fn with_processor_number(self, processor_number: u8) -> Self {
        return Self {
            processor_number,
            ..self
        };
    }

    /// Returns a copy with kernel and user times set.
    pub const fn with_cpu_times(self, kernel_time: u64, user_time: u64) -> Self {
        return Self {
            kernel_time: Some(kernel_time),
            user_time: Some(user_time),
            ..self
        };
    }

    /// Returns a copy with processor time set.
    pub const fn with_processor_time(self, processor_time: u64) -> Self {
        return Self {
            processor_time: Some(processor_time),
            ..self
        };
    }
}

impl Default for RecordContext {
    fn default() -> Self {
        return Self::new(PointerWidth::host());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builder() {
        let ctx = RecordContext::new(PointerWidth::Bits32)
            .with_ids(4, 8)
            .with_timestamp(-1)
            .with_processor_number(3)
            .with_cpu_times(10, 20);
        assert_eq!(4, ctx.process_id);
        assert_eq!(8, ctx.thread_id);
        assert_eq!(-1, ctx.timestamp);
        assert_eq!(3, ctx.processor_number);
        assert_eq!(PointerWidth::Bits32, ctx.pointer_width);
        assert_eq!(Some(10), ctx.kernel_time);
        assert_eq!(Some(20), ctx.user_time);
        assert_eq!(None, ctx.processor_time);
    }
}
