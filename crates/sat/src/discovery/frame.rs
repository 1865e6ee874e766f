// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery frame codec.
//!
//! # Wire Format
//!
//! ```text
//! offset 0:  version       (1 byte, PROTOCOL_VERSION)
//! offset 1:  type          (1 byte: 1=announce, 2=interest, 3=heartbeat, 4=vanish)
//! offset 2:  sender uuid   (16 bytes)
//! offset 18: payload
//!            announce:  service_name[129] service_port[7] address[65]
//!            others:    service_name[129]
//! ```
//!
//! All fields are NUL padded; there are no multi-byte integers, so the layout
//! is byte-order independent. Frames are always emitted at [`FRAME_SIZE`]
//! bytes, shorter payloads zero padded.

use super::config::validate_field;
use super::wire::{FrameReader, FrameWriter};
use crate::config::{
    ADDRESS_FIELD, FRAME_SIZE, HEADER_SIZE, PROTOCOL_VERSION, SERVICE_NAME_FIELD,
    SERVICE_PORT_FIELD, UUID_SIZE,
};
use crate::error::{Error, Result};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Announce = 1,
    Interest = 2,
    Heartbeat = 3,
    Vanish = 4,
}

impl FrameType {
    /// Payload length carried by frames of this type.
    pub const fn payload_size(self) -> usize {
        match self {
            FrameType::Announce => SERVICE_NAME_FIELD + SERVICE_PORT_FIELD + ADDRESS_FIELD,
            FrameType::Interest | FrameType::Heartbeat | FrameType::Vanish => SERVICE_NAME_FIELD,
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(FrameType::Announce),
            2 => Ok(FrameType::Interest),
            3 => Ok(FrameType::Heartbeat),
            4 => Ok(FrameType::Vanish),
            other => Err(Error::InvalidFrameType(other)),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FrameType::Announce => "ANNOUNCE",
            FrameType::Interest => "INTEREST",
            FrameType::Heartbeat => "HEARTBEAT",
            FrameType::Vanish => "VANISH",
        };
        f.write_str(label)
    }
}

/// Type-specific frame content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// "I provide `service_name` at `address`:`service_port`"
    Announce {
        service_name: String,
        service_port: String,
        address: String,
    },
    /// "Who provides `service_name`?"
    Interest { service_name: String },
    /// "`service_name` is still alive"
    Heartbeat { service_name: String },
    /// "`service_name` is leaving"
    Vanish { service_name: String },
}

impl Payload {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Payload::Announce { .. } => FrameType::Announce,
            Payload::Interest { .. } => FrameType::Interest,
            Payload::Heartbeat { .. } => FrameType::Heartbeat,
            Payload::Vanish { .. } => FrameType::Vanish,
        }
    }

    pub fn service_name(&self) -> &str {
        match self {
            Payload::Announce { service_name, .. }
            | Payload::Interest { service_name }
            | Payload::Heartbeat { service_name }
            | Payload::Vanish { service_name } => service_name,
        }
    }
}

/// One discovery datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sender: Uuid,
    pub payload: Payload,
}

impl Frame {
    /// # Errors
    /// `Error::InvalidArgument` / `Error::FieldTooLong` if a field is empty or
    /// does not fit its slot.
    pub fn announce(sender: Uuid, service_name: &str, service_port: &str, address: &str) -> Result<Self> {
        validate_field("service_name", service_name, SERVICE_NAME_FIELD)?;
        validate_field("service_port", service_port, SERVICE_PORT_FIELD)?;
        // address may be empty; receivers fall back to the datagram source
        if !address.is_empty() {
            validate_field("address", address, ADDRESS_FIELD)?;
        }
        Ok(Self {
            sender,
            payload: Payload::Announce {
                service_name: service_name.to_string(),
                service_port: service_port.to_string(),
                address: address.to_string(),
            },
        })
    }

    pub fn interest(sender: Uuid, service_name: &str) -> Result<Self> {
        validate_field("service_name", service_name, SERVICE_NAME_FIELD)?;
        Ok(Self {
            sender,
            payload: Payload::Interest {
                service_name: service_name.to_string(),
            },
        })
    }

    pub fn heartbeat(sender: Uuid, service_name: &str) -> Result<Self> {
        validate_field("service_name", service_name, SERVICE_NAME_FIELD)?;
        Ok(Self {
            sender,
            payload: Payload::Heartbeat {
                service_name: service_name.to_string(),
            },
        })
    }

    pub fn vanish(sender: Uuid, service_name: &str) -> Result<Self> {
        validate_field("service_name", service_name, SERVICE_NAME_FIELD)?;
        Ok(Self {
            sender,
            payload: Payload::Vanish {
                service_name: service_name.to_string(),
            },
        })
    }

    pub fn version(&self) -> u8 {
        PROTOCOL_VERSION
    }

    pub fn frame_type(&self) -> FrameType {
        self.payload.frame_type()
    }

    /// Encode into `buf`, returning the number of bytes written ([`FRAME_SIZE`]).
    ///
    /// # Errors
    /// `Error::BufferTooSmall` if `buf` is shorter than [`FRAME_SIZE`];
    /// `Error::FieldTooLong` if a field was altered to exceed its slot.
    pub fn pack(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < FRAME_SIZE {
            return Err(Error::BufferTooSmall {
                required: FRAME_SIZE,
                available: buf.len(),
            });
        }

        let mut writer = FrameWriter::new(buf);
        writer.write_u8(PROTOCOL_VERSION)?;
        writer.write_u8(self.frame_type() as u8)?;
        writer.write_bytes(self.sender.as_bytes())?;

        match &self.payload {
            Payload::Announce {
                service_name,
                service_port,
                address,
            } => {
                writer.write_field("service_name", service_name, SERVICE_NAME_FIELD)?;
                writer.write_field("service_port", service_port, SERVICE_PORT_FIELD)?;
                writer.write_field("address", address, ADDRESS_FIELD)?;
            }
            Payload::Interest { service_name }
            | Payload::Heartbeat { service_name }
            | Payload::Vanish { service_name } => {
                writer.write_field("service_name", service_name, SERVICE_NAME_FIELD)?;
            }
        }

        writer.pad_to(FRAME_SIZE)?;
        Ok(writer.offset())
    }

    /// Encode into a freshly allocated frame-sized buffer.
    pub fn to_bytes(&self) -> Result<[u8; FRAME_SIZE]> {
        let mut buf = [0u8; FRAME_SIZE];
        self.pack(&mut buf)?;
        Ok(buf)
    }

    /// Decode a datagram.
    ///
    /// # Errors
    /// - `Error::Truncated` if shorter than the header plus the type's payload
    /// - `Error::VersionMismatch` if byte 0 is not [`PROTOCOL_VERSION`]
    /// - `Error::InvalidFrameType` if byte 1 is outside 1..=4
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut reader = FrameReader::new(bytes);
        let version = reader.read_u8()?;
        if version != PROTOCOL_VERSION {
            return Err(Error::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: version,
            });
        }
        let frame_type = FrameType::try_from(reader.read_u8()?)?;
        let sender = Uuid::from_bytes(reader.read_array::<UUID_SIZE>()?);

        let payload = match frame_type {
            FrameType::Announce => Payload::Announce {
                service_name: reader.read_field(SERVICE_NAME_FIELD)?,
                service_port: reader.read_field(SERVICE_PORT_FIELD)?,
                address: reader.read_field(ADDRESS_FIELD)?,
            },
            FrameType::Interest => Payload::Interest {
                service_name: reader.read_field(SERVICE_NAME_FIELD)?,
            },
            FrameType::Heartbeat => Payload::Heartbeat {
                service_name: reader.read_field(SERVICE_NAME_FIELD)?,
            },
            FrameType::Vanish => Payload::Vanish {
                service_name: reader.read_field(SERVICE_NAME_FIELD)?,
            },
        };

        log::trace!(
            "[frame] decoded {} from {}, {} bytes unread",
            frame_type,
            sender,
            reader.remaining()
        );
        Ok(Self { sender, payload })
    }
}
