// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Schemas for common classic kernel events and the `KernelTraceControl`
//! events that xperf and PerfView add during merge.
//!
//! Classic events have event id 0 and are identified by class GUID, opcode,
//! and version.

use etw_types::EventKey;
use etw_types::Guid;

use crate::ArrayCount;
use crate::ElementType;
use crate::EventSchema;
use crate::FieldDesc;
use crate::FieldKind;
use crate::ScalarType;
use crate::SchemaKey;

const U8: FieldKind = FieldKind::Scalar(ScalarType::U8);
const I8: FieldKind = FieldKind::Scalar(ScalarType::I8);
const U16: FieldKind = FieldKind::Scalar(ScalarType::U16);
const U32: FieldKind = FieldKind::Scalar(ScalarType::U32);
const I32: FieldKind = FieldKind::Scalar(ScalarType::I32);
const U64: FieldKind = FieldKind::Scalar(ScalarType::U64);
const PTR: FieldKind = FieldKind::Pointer;

/// `Process` class: `3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7c`.
pub const PROCESS_GUID: Guid = Guid::from_fields(
    0x3d6fa8d0,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// `Thread` class: `3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c`.
pub const THREAD_GUID: Guid = Guid::from_fields(
    0x3d6fa8d1,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// `Image` class: `2cb15d1d-5fc1-11d2-abe1-00a0c911f518`.
pub const IMAGE_GUID: Guid = Guid::from_fields(
    0x2cb15d1d,
    0x5fc1,
    0x11d2,
    [0xab, 0xe1, 0x00, 0xa0, 0xc9, 0x11, 0xf5, 0x18],
);

/// `PerfInfo` class: `ce1dbfb4-137e-4da6-87b0-3f59aa102cbc`.
pub const PERF_INFO_GUID: Guid = Guid::from_fields(
    0xce1dbfb4,
    0x137e,
    0x4da6,
    [0x87, 0xb0, 0x3f, 0x59, 0xaa, 0x10, 0x2c, 0xbc],
);

/// `StackWalk` class: `def2fe46-7bd6-4b80-bd94-f57fe20d0ce3`.
pub const STACK_WALK_GUID: Guid = Guid::from_fields(
    0xdef2fe46,
    0x7bd6,
    0x4b80,
    [0xbd, 0x94, 0xf5, 0x7f, 0xe2, 0x0d, 0x0c, 0xe3],
);

/// `KernelTraceControl` image identity events: `b3e675d7-2554-4f18-830b-2762732560de`.
pub const KERNEL_TRACE_CONTROL_GUID: Guid = Guid::from_fields(
    0xb3e675d7,
    0x2554,
    0x4f18,
    [0x83, 0x0b, 0x27, 0x62, 0x73, 0x25, 0x60, 0xde],
);

/// `KernelTraceControl` metadata events: `bbccf6c1-6cd1-48c4-80ff-839482e37671`.
pub const KERNEL_TRACE_CONTROL_METADATA_GUID: Guid = Guid::from_fields(
    0xbbccf6c1,
    0x6cd1,
    0x48c4,
    [0x80, 0xff, 0x83, 0x94, 0x82, 0xe3, 0x76, 0x71],
);

const PROCESS_V4_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("UniqueProcessKey", PTR),
    FieldDesc::new("ProcessId", U32),
    FieldDesc::new("ParentId", U32),
    FieldDesc::new("SessionId", U32),
    FieldDesc::new("ExitStatus", I32),
    FieldDesc::new("DirectoryTableBase", PTR),
    FieldDesc::new("Flags", U32),
    FieldDesc::new("UserSID", FieldKind::Sid),
    FieldDesc::new("ImageFileName", FieldKind::AnsiZ),
    FieldDesc::new("CommandLine", FieldKind::Utf16Z),
    FieldDesc::new("PackageFullName", FieldKind::Utf16Z),
    FieldDesc::new("ApplicationId", FieldKind::Utf16Z),
];

const THREAD_V3_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("ProcessId", U32),
    FieldDesc::new("TThreadId", U32),
    FieldDesc::new("StackBase", PTR),
    FieldDesc::new("StackLimit", PTR),
    FieldDesc::new("UserStackBase", PTR),
    FieldDesc::new("UserStackLimit", PTR),
    FieldDesc::new("Affinity", PTR),
    FieldDesc::new("Win32StartAddr", PTR),
    FieldDesc::new("TebBase", PTR),
    FieldDesc::new("SubProcessTag", U32),
    FieldDesc::new("BasePriority", U8),
    FieldDesc::new("PagePriority", U8),
    FieldDesc::new("IoPriority", U8),
    FieldDesc::new("ThreadFlags", U8),
];

const CSWITCH_V4_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("NewThreadId", U32),
    FieldDesc::new("OldThreadId", U32),
    FieldDesc::new("NewThreadPriority", I8),
    FieldDesc::new("OldThreadPriority", I8),
    FieldDesc::new("PreviousCState", U8),
    FieldDesc::new("SpareByte", I8),
    FieldDesc::new("OldThreadWaitReason", I8),
    FieldDesc::new("ThreadFlags", I8),
    FieldDesc::new("OldThreadState", I8),
    FieldDesc::new("OldThreadWaitIdealProcessor", I8),
    FieldDesc::new("NewThreadWaitTime", U32),
    FieldDesc::new("Reserved", U32),
];

const IMAGE_V3_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("ImageBase", PTR),
    FieldDesc::new("ImageSize", PTR),
    FieldDesc::new("ProcessId", U32),
    FieldDesc::new("ImageCheckSum", U32),
    FieldDesc::new("TimeDateStamp", U32),
    FieldDesc::new("SignatureLevel", U8),
    FieldDesc::new("SignatureType", U8),
    FieldDesc::new("Reserved0", U16),
    FieldDesc::new("DefaultBase", PTR),
    FieldDesc::new("Reserved1", U32),
    FieldDesc::new("Reserved2", U32),
    FieldDesc::new("Reserved3", U32),
    FieldDesc::new("Reserved4", U32),
    FieldDesc::new("FileName", FieldKind::Utf16Z),
];

const SAMPLE_PROF_V2_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("InstructionPointer", PTR),
    FieldDesc::new("ThreadId", U32),
    FieldDesc::new("Count", U16),
    FieldDesc::new("Reserved", U16),
];

const STACK_V2_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("EventTimeStamp", U64),
    FieldDesc::new("StackProcess", U32),
    FieldDesc::new("StackThread", U32),
    FieldDesc::new(
        "Stack",
        FieldKind::Array {
            element: ElementType::Pointer,
            count: ArrayCount::RestOfPayload,
        },
    ),
];

const IMAGE_ID_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("ImageBase", PTR),
    FieldDesc::new("ImageSize", U32),
    FieldDesc::new("Unknown", PTR),
    FieldDesc::new("TimeDateStamp", U32),
    FieldDesc::new("OriginalFileName", FieldKind::Utf16Z),
];

const DBG_ID_RSDS_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("ImageBase", U64),
    FieldDesc::new("ProcessId", U32),
    FieldDesc::new("GuidSig", FieldKind::Guid),
    FieldDesc::new("Age", U32),
    FieldDesc::new("PdbFileName", FieldKind::AnsiZ),
];

const EVENT_INFO_FIELDS: &[FieldDesc<'static>] = &[
    FieldDesc::new("ProviderGuid", FieldKind::Guid),
    FieldDesc::new("EventGuid", FieldKind::Guid),
    FieldDesc::new("EventDescriptorId", U16),
    FieldDesc::new("EventDescriptor.Version", U8),
    FieldDesc::new("EventDescriptor.Channel", U8),
    FieldDesc::new("EventDescriptor.Level", U8),
    FieldDesc::new("EventDescriptor.Opcode", U8),
    FieldDesc::new("EventDescriptor.Task", U16),
    FieldDesc::new("EventDescriptor.Keyword", U64),
];

const fn classic(
    class: Guid,
    opcode: u8,
    version: u8,
    provider_name: &'static str,
    task_name: &'static str,
    opcode_name: &'static str,
    fields: &'static [FieldDesc<'static>],
) -> EventSchema<'static> {
    return EventSchema::new(
        SchemaKey::new(class, 0, opcode, version),
        provider_name,
        task_name,
        opcode_name,
        fields,
    );
}

const KERNEL: &str = "MSNT_SystemTrace";
const KTC: &str = "KernelTraceControl";

/// `Process/Start` version 4.
pub const PROCESS_START_V4: EventSchema<'static> =
    classic(PROCESS_GUID, 1, 4, KERNEL, "Process", "Start", PROCESS_V4_FIELDS);

/// `Process/DCStart` version 4. Same layout as `Process/Start`.
pub const PROCESS_DC_START_V4: EventSchema<'static> =
    classic(PROCESS_GUID, 3, 4, KERNEL, "Process", "DCStart", PROCESS_V4_FIELDS);

/// `Thread/Start` version 3.
pub const THREAD_START_V3: EventSchema<'static> =
    classic(THREAD_GUID, 1, 3, KERNEL, "Thread", "Start", THREAD_V3_FIELDS);

/// `Thread/DCStart` version 3. Same layout as `Thread/Start`.
pub const THREAD_DC_START_V3: EventSchema<'static> =
    classic(THREAD_GUID, 3, 3, KERNEL, "Thread", "DCStart", THREAD_V3_FIELDS);

/// `Thread/CSwitch` version 4.
pub const CSWITCH_V4: EventSchema<'static> =
    classic(THREAD_GUID, 36, 4, KERNEL, "Thread", "CSwitch", CSWITCH_V4_FIELDS);

/// `Image/Load` version 3.
pub const IMAGE_LOAD_V3: EventSchema<'static> =
    classic(IMAGE_GUID, 10, 3, KERNEL, "Image", "Load", IMAGE_V3_FIELDS);

/// `Image/DCStart` version 3. Same layout as `Image/Load`.
pub const IMAGE_DC_START_V3: EventSchema<'static> =
    classic(IMAGE_GUID, 3, 3, KERNEL, "Image", "DCStart", IMAGE_V3_FIELDS);

/// `PerfInfo/SampleProf` version 2.
pub const SAMPLE_PROF_V2: EventSchema<'static> = classic(
    PERF_INFO_GUID,
    46,
    2,
    KERNEL,
    "PerfInfo",
    "SampleProf",
    SAMPLE_PROF_V2_FIELDS,
);

/// `StackWalk/Stack` version 2. The stack is every remaining address in the payload.
pub const STACK_V2: EventSchema<'static> =
    classic(STACK_WALK_GUID, 32, 2, KERNEL, "StackWalk", "Stack", STACK_V2_FIELDS);

/// `KernelTraceControl` `ImageID` version 2.
pub const IMAGE_ID_V2: EventSchema<'static> =
    classic(KERNEL_TRACE_CONTROL_GUID, 0, 2, KTC, "ImageID", "", IMAGE_ID_FIELDS);

/// `KernelTraceControl` `ImageID/DbgID_RSDS` version 2: PDB identity of an image.
pub const DBG_ID_RSDS_V2: EventSchema<'static> = classic(
    KERNEL_TRACE_CONTROL_GUID,
    36,
    2,
    KTC,
    "ImageID",
    "DbgID_RSDS",
    DBG_ID_RSDS_FIELDS,
);

/// `KernelTraceControl` `MetaData/EventInfo` version 0: an event descriptor.
pub const EVENT_INFO_V0: EventSchema<'static> = classic(
    KERNEL_TRACE_CONTROL_METADATA_GUID,
    32,
    0,
    KTC,
    "MetaData",
    "EventInfo",
    EVENT_INFO_FIELDS,
);

const KERNEL_SCHEMAS: &[EventSchema<'static>] = &[
    PROCESS_START_V4,
    PROCESS_DC_START_V4,
    THREAD_START_V3,
    THREAD_DC_START_V3,
    CSWITCH_V4,
    IMAGE_LOAD_V3,
    IMAGE_DC_START_V3,
    SAMPLE_PROF_V2,
    STACK_V2,
    IMAGE_ID_V2,
    DBG_ID_RSDS_V2,
    EVENT_INFO_V0,
];

/// A set of schemas searchable by [`SchemaKey`].
#[derive(Clone, Copy, Debug)]
pub struct SchemaTable<'a> {
    schemas: &'a [EventSchema<'a>],
}

impl<'a> SchemaTable<'a> {
    /// Creates a table over `schemas`. If two schemas have the same key,
    /// lookups return the first.
    pub const fn new(schemas: &'a [EventSchema<'a>]) -> Self {
        return Self { schemas };
    }

    /// The built-in kernel schemas defined in this module.
    pub const fn kernel() -> SchemaTable<'static> {
        return SchemaTable::new(KERNEL_SCHEMAS);
    }

    /// Number of schemas.
    pub const fn len(&self) -> usize {
        return self.schemas.len();
    }

    /// True if the table has no schemas.
    pub const fn is_empty(&self) -> bool {
        return self.schemas.is_empty();
    }

    /// Returns the schema for `key`.
    pub fn find(&self, key: &SchemaKey) -> Option<&'a EventSchema<'a>> {
        return self.schemas.iter().find(|schema| schema.key() == key);
    }

    /// Returns the schema for the event identified by `key`.
    pub fn find_event(&self, key: &EventKey) -> Option<&'a EventSchema<'a>> {
        return self.find(&SchemaKey::from_event_key(key));
    }

    /// Returns an iterator over the schemas.
    pub fn iter(&self) -> core::slice::Iter<'a, EventSchema<'a>> {
        return self.schemas.iter();
    }
}

impl<'a> IntoIterator for SchemaTable<'a> {
    type Item = &'a EventSchema<'a>;
    type IntoIter = core::slice::Iter<'a, EventSchema<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        return self.schemas.iter();
    }
}
