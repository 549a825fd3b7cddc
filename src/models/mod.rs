//! Per-model specifications
//!
//! One module per StreamDock model: geometry, report sizing, capability
//! defaults, the logical-index ↔ hardware-code translation table, and the
//! event decoder. Hardware codes and tables come straight from the vendor
//! protocol for each unit.

pub mod k1pro;
pub mod m18;
pub mod m3;
pub mod n1;
pub mod n3;
pub mod n4;
pub mod n4pro;
pub mod sd293s_v3;
pub mod sd293v2;
pub mod xl;
