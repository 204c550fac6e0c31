// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Demonstrates how to use [`ed::EventView`] to decode an event payload.
//!
//! `EventView` needs the event's schema, the pointer width of the process that
//! logged the event, and the payload bytes. In practice, you would get these
//! from a trace session or an ETL file reader. For purposes of this sample, the
//! event identity and pointer width come from the command line and the payload
//! is read from a file.
//!
//! Usage: `dump_payload <class-guid> <opcode> <version> <32|64> <payload-file>`

use std::env;
use std::fs;
use std::process;

use etw_decode as ed;
use etw_types::Guid;
use etw_types::PointerWidth;
use etw_types::RecordContext;

fn main() -> process::ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 5 {
        return usage();
    }

    let provider_id = match Guid::try_parse(&args[0]) {
        Some(guid) => guid,
        None => {
            eprintln!("Invalid GUID: {}", args[0]);
            return usage();
        }
    };

    let (opcode, version) = match (args[1].parse::<u8>(), args[2].parse::<u8>()) {
        (Ok(opcode), Ok(version)) => (opcode, version),
        _ => {
            eprintln!("Invalid opcode or version: {} {}", args[1], args[2]);
            return usage();
        }
    };

    let bits = args[3].parse::<u8>().ok().filter(|bits| bits % 8 == 0);
    let pointer_width = match bits.and_then(|bits| PointerWidth::from_size(bits / 8)) {
        Some(pointer_width) => pointer_width,
        None => {
            eprintln!("Invalid pointer width: {}", args[3]);
            return usage();
        }
    };

    let table = ed::SchemaTable::kernel();
    let key = ed::SchemaKey::new(provider_id, 0, opcode, version);
    let schema = match table.find(&key) {
        Some(schema) => schema,
        None => {
            eprintln!(
                "No schema for {} opcode {} version {}",
                provider_id, opcode, version
            );
            eprintln!("Known schemas:");
            for schema in table.iter() {
                let key = schema.key();
                eprintln!("  {} {} {} {}", key.provider_id, key.opcode, key.version, schema);
            }
            return process::ExitCode::FAILURE;
        }
    };

    let payload = match fs::read(&args[4]) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Error {} reading from {}", e, args[4]);
            return process::ExitCode::FAILURE;
        }
    };

    let view = ed::EventView::new(schema, RecordContext::new(pointer_width), &payload);
    println!("{} ({} bytes, {})", schema, payload.len(), pointer_width);

    let mut result = process::ExitCode::SUCCESS;
    for (name, value) in view.values() {
        match value {
            Ok(ed::FieldValue::Array(array)) => {
                println!("  {}: [{} elements]", name, array.len());
                for element in array {
                    println!("    {:?}", element);
                }
            }
            Ok(value) => println!("  {}: {:?}", name, value),
            Err(e) => {
                println!("  {}: error: {}", name, e);
                result = process::ExitCode::FAILURE;
            }
        }
    }

    return result;
}

fn usage() -> process::ExitCode {
    eprintln!("Usage: dump_payload <class-guid> <opcode> <version> <32|64> <payload-file>");
    return process::ExitCode::FAILURE;
}
