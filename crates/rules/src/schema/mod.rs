//! Rule config schema: raw serde form, typed rules, and the catalogue.
//!
//! Loading is two-pass: a permissive [`RuleSpec`] captures whatever the
//! config file says, then validation converts the full list into typed
//! [`AlertRule`] values grouped in an immutable [`RuleCatalog`].

mod catalog;
mod rule;
mod spec;

pub use catalog::*;
pub use rule::*;
pub use spec::*;

#[cfg(test)]
mod tests;
