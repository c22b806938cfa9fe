//! Process-wide settings.
//!
//! Numeric code always takes `&Settings` explicitly. This cell only provides
//! the default a new `Runtime` snapshots, so that an embedding calculator can
//! change the display mode in one place.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rpl_common_core::Settings;

static CURRENT: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

/// Copy of the process-wide settings.
pub fn current() -> Settings {
    *CURRENT.read()
}

pub fn set_current(settings: Settings) {
    tracing::debug!(?settings, "settings replaced");
    *CURRENT.write() = settings;
}

/// Modify the process-wide settings in place and return the new value.
pub fn update(f: impl FnOnce(&mut Settings)) -> Settings {
    let mut guard = CURRENT.write();
    f(&mut guard);
    *guard
}
