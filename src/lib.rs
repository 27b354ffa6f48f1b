#![doc(test(attr(deny(warnings))))]

//! Claims Core offers the form-tree, wizard, and submission primitives that
//! power multi-step insurance intake flows: accident reports, mandatory and
//! third-party policy forms, and similar deep nested-form wizards.

pub mod config;
pub mod errors;
pub mod normalize;
pub mod path;
pub mod schema;
pub mod session;
pub mod steps;
pub mod store;
pub mod submit;
pub mod utils;
pub mod validate;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Claims Core tracing initialized.");
    });
}
