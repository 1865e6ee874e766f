// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sat::config::FRAME_SIZE;
use sat::discovery::Frame;

fuzz_target!(|data: &[u8]| {
    // Any datagram must decode or fail cleanly; decoded frames re-encode
    if let Ok(frame) = Frame::unpack(data) {
        let mut buf = [0u8; FRAME_SIZE];
        let _ = frame.pack(&mut buf);
    }
});
