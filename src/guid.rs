//! RFC 4122 GUIDs, stored as two `u64` halves.
//!
//! Grounded on `Guid.h`/`Guid.cpp`: a GUID is 16 raw bytes reinterpreted as two little
//! endian `u64`s (`a` = bytes 0..8, `b` = bytes 8..16), formatted as the usual
//! `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` dashed hex string with dashes after bytes
//! 4, 6, 8 and 10.

use bytemuck::{Pod, Zeroable};
use std::fmt;

#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct Guid {
	pub a: u64,
	pub b: u64,
}

impl Guid {
	pub const INVALID: Guid = Guid { a: 0, b: 0 };

	pub fn to_bytes(self) -> [u8; 16] {
		let mut bytes = [0u8; 16];
		bytes[0..8].copy_from_slice(&self.a.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.b.to_le_bytes());
		bytes
	}

	pub fn from_bytes(bytes: [u8; 16]) -> Self {
		Guid {
			a: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
			b: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
		}
	}
}

impl Default for Guid {
	fn default() -> Self {
		Guid::INVALID
	}
}

impl fmt::Debug for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Guid({})", guid_to_string(*self))
	}
}

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", guid_to_string(*self))
	}
}

/// Parses a dashed 36-character GUID string. Returns `Guid::INVALID` on any malformed
/// input, matching `InputGuidFromString`'s behavior of never failing loudly.
pub fn guid_from_str(s: &str) -> Guid {
	let bytes = s.as_bytes();
	if bytes.len() != 36 || bytes[8] != b'-' || bytes[13] != b'-' || bytes[18] != b'-' || bytes[23] != b'-' {
		return Guid::INVALID;
	}

	let mut hex = String::with_capacity(32);
	for (i, &c) in bytes.iter().enumerate() {
		if matches!(i, 8 | 13 | 18 | 23) {
			continue;
		}
		hex.push(c as char);
	}

	let mut raw = [0u8; 16];
	for i in 0..16 {
		match u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16) {
			Ok(byte) => raw[i] = byte,
			Err(_) => return Guid::INVALID,
		}
	}
	Guid::from_bytes(raw)
}

pub fn guid_to_string(guid: Guid) -> String {
	let bytes = guid.to_bytes();
	let mut out = String::with_capacity(36);
	for (i, b) in bytes.iter().enumerate() {
		if matches!(i, 4 | 6 | 8 | 10) {
			out.push('-');
		}
		out.push_str(&format!("{:02x}", b));
	}
	out
}
