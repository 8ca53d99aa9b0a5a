//! RDTech UM-series USB meter protocol
//!
//! This crate provides types and utilities for talking to the UM24C, UM25C
//! and UM34C USB power meters over their serial (or Bluetooth serial) link.
//! The protocol is a simple request/response exchange of raw bytes.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → meter): a single byte. Some commands carry a
//!   small parameter added to the opcode base (e.g. `0xE0 + minutes`).
//! - **Data dump** (meter → host): the reply to [`CMD_REQUEST_DATA`], a
//!   fixed 130-byte big-endian record. No other command is answered.
//!
//! Raw integers in the dump are scaled differently depending on the model,
//! so decoding happens in two steps: [`RawFrame`] holds the integers as
//! stored, [`Reading`] holds the converted values.
//!
//! # Example
//!
//! ```rust,ignore
//! use ummeter_protocol::{Command, Reading};
//!
//! // Build a command
//! let byte = Command::ScreenBrightness { level: 3 }.encode()?;
//!
//! // Decode a data dump
//! let reading = Reading::decode(&received_data)?;
//! println!("{} {:.3} V", reading.model, reading.voltage);
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod reading;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use reading::*;
pub use types::*;
