// Shared utilities
//
// IMPORTANT:
// - Never log secrets (connection strings, credentials).

pub mod logging;
pub mod validation;
