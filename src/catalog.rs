//! Model catalog
//!
//! Maps `(vendor_id, product_id)` to the [`ModelSpec`] that knows how to
//! drive that unit. Lookup goes through a hash map built once on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::ReportConfig;

use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;
use crate::models;

/// Everything the binder needs to instantiate one model
pub struct ModelSpec {
    pub family: ModelFamily,
    /// `(vid, pid)` pairs this spec claims
    pub ids: &'static [(u16, u16)],
    pub report: ReportConfig,
    pub display: (u16, u16),
    pub key_size: (u16, u16),
    pub key_range: (u16, u16),
    pub key_rotation: f64,
    pub bg_rotation: f64,
    /// (vertical, horizontal)
    pub key_flips: (bool, bool),
    pub bg_flips: (bool, bool),
    pub key_codec: ImageCodec,
    pub bg_codec: ImageCodec,
    pub bg_raw_format: RawFormat,
    pub caps: Capabilities,
    /// Logical index → hardware response code
    pub input_map: &'static [(u16, u8)],
    /// `(hardware code, event value)` → semantic event
    pub decode: fn(u8, u8) -> Event,
    /// Capability adjustment keyed on the firmware string, applied at bind
    /// before any controller reads the flags
    pub firmware_adjust: Option<fn(&str, &mut Capabilities)>,
}

impl ModelSpec {
    /// Hardware code for a logical index, if the model defines one.
    pub fn hardware_code(&self, logical: u16) -> Option<u8> {
        self.input_map
            .iter()
            .find(|(index, _)| *index == logical)
            .map(|(_, code)| *code)
    }
}

/// All supported models
pub static MODELS: &[&ModelSpec] = &[
    &models::sd293v2::SPEC,
    &models::sd293s_v3::SPEC,
    &models::n1::SPEC,
    &models::n3::SPEC,
    &models::n4::SPEC,
    &models::n4pro::SPEC,
    &models::m18::SPEC,
    &models::m3::SPEC,
    &models::xl::SPEC,
    &models::k1pro::SPEC,
];

fn index() -> &'static HashMap<(u16, u16), &'static ModelSpec> {
    static INDEX: OnceLock<HashMap<(u16, u16), &'static ModelSpec>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for spec in MODELS {
            for &id in spec.ids {
                map.insert(id, *spec);
            }
        }
        map
    })
}

/// Find the model spec for a `(vid, pid)` pair.
pub fn lookup(vid: u16, pid: u16) -> Option<&'static ModelSpec> {
    index().get(&(vid, pid)).copied()
}

/// Whether any model claims this `(vid, pid)` pair.
pub fn is_supported(vid: u16, pid: u16) -> bool {
    index().contains_key(&(vid, pid))
}
