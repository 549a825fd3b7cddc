//! Configuration vector builder
//!
//! Device configuration is an enum-indexed array of state bytes. Unspecified
//! slots take the default filler; the wire byte values come from the device
//! firmware.

/// State byte for one configuration slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigState {
    /// Filler for slots the caller did not set
    Default,
    On,
    Off,
    /// Follow system/default behavior
    Follow,
}

impl ConfigState {
    pub fn byte(self) -> u8 {
        match self {
            ConfigState::Default | ConfigState::On => 0x11,
            ConfigState::Off => 0xFF,
            ConfigState::Follow => 0x1F,
        }
    }
}

/// A device's configuration schema: how many slots the vector has and which
/// slot each item occupies.
pub trait ConfigSchema: Copy {
    const COUNT: usize;
    fn index(self) -> usize;
}

/// Build a configuration vector from `(item, state)` pairs; every other slot
/// is filled with the default byte. Out-of-range indices are ignored.
pub fn build_config<S: ConfigSchema>(changes: &[(S, ConfigState)]) -> Vec<u8> {
    let mut configs = vec![ConfigState::Default.byte(); S::COUNT];
    for &(item, state) in changes {
        if let Some(slot) = configs.get_mut(item.index()) {
            *slot = state.byte();
        }
    }
    configs
}

/// Configuration items of the N4 Pro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum N4ProConfig {
    LedFollowKeyLight,
    KeyLightOnDisconnect,
    CheckUsbPower,
    EnableVibration,
    ResetUsbReport,
    EnableBootVideo,
}

impl ConfigSchema for N4ProConfig {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}
