//! FILENAME: core/pivot-core/src/logging.rs
// PURPOSE: Category-tagged logging macros over the `log` facade.
//
// The category becomes the log target, so hosts can filter e.g. "DRILL"
// independently of "PIVOT". This crate never installs a logger.

// ============================================================================
// CATEGORIES
// ============================================================================

pub const CAT_PIVOT: &str = "PIVOT";
pub const CAT_RESOLVE: &str = "RESOLVE";
pub const CAT_DRILL: &str = "DRILL";

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $cat, $($arg)*)
    };
}
