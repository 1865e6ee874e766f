// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sat::discovery::{Frame, Uuid};

fuzz_target!(|data: &[u8]| {
    // Split the input into name / port / address candidates
    let text = String::from_utf8_lossy(data);
    let mut parts = text.splitn(3, '|');
    let name = parts.next().unwrap_or_default();
    let port = parts.next().unwrap_or_default();
    let address = parts.next().unwrap_or_default();

    // Every frame a constructor accepts must survive pack/unpack unchanged
    if let Ok(frame) = Frame::announce(uuid_from(data), name, port, address) {
        let bytes = frame.to_bytes().expect("constructed frames always pack");
        assert_eq!(Frame::unpack(&bytes).expect("packed frames always unpack"), frame);
    }
});

fn uuid_from(data: &[u8]) -> Uuid {
    let mut bytes = [0u8; 16];
    for (slot, byte) in bytes.iter_mut().zip(data.iter().rev()) {
        *slot = *byte;
    }
    Uuid::from_bytes(bytes)
}
