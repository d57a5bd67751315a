//! Scenario tests spanning several modules
//!
//! Each file drives the public service API end to end; unit tests for a
//! single module live next to that module.

mod deferred_delete;
mod transforms;
