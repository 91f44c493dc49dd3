//! Beacon configuration, installation and host handle.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Beacon`] | Validated configuration, installs the runtime |
//! | [`BeaconBuilder`] | Fluent configuration with validation |
//! | [`BeaconHandle`] | Forwards host signals to the runtime |
//! | [`BeaconOptions`] | Timers and limits |
//! | [`DeploymentMode`] | Production gate |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent configuration.
pub mod builder;

/// Beacon entry point and runtime loop.
pub mod core;

/// Host-side handle.
pub mod handle;

/// Timers, limits and deployment mode.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{BeaconBuilder, DEFAULT_ENDPOINT, DEFAULT_SITE};
pub use core::Beacon;
pub use handle::{BeaconHandle, HostSignal};
pub use options::{BeaconOptions, DeploymentMode, MODE_ENV_VAR};
