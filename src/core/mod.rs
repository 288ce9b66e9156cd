//! Core generation engine: rule table, session state, the two mutually
//! recursive rewriters, the cosmetic mutation pass, and the driver.

pub mod directive;
pub mod engine;
pub mod expand;
pub mod mutate;
pub mod rules;
pub mod session;
