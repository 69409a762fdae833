//! # Escolar Identity
//!
//! Maps an authenticated [`Subject`](escolar_models::Subject) to exactly one
//! typed [`RoleProfile`](escolar_models::RoleProfile):
//!
//! 1. [`prober`]: ordered, short-circuiting probes find the role and its link row
//! 2. [`gate`]: the tenant (school or authority) is loaded and judged
//! 3. [`enrich`]: the role's relational payload is fetched, tolerating failures
//!
//! [`pipeline::IdentityPipeline`] runs the three stages and reduces them to a
//! single [`PipelineOutcome`]. None of the stages touch session state; the
//! session coordinator decides what an outcome means for the published state.

pub mod enrich;
pub mod gate;
pub mod pipeline;
pub mod prober;

#[cfg(test)]
pub(crate) mod test_support;

pub use enrich::ProfileEnricher;
pub use gate::{GateOutcome, TenantRef, TenantResolver, gate};
pub use pipeline::{IdentityPipeline, PipelineOutcome};
pub use prober::{LinkData, ProbeStep, ResolutionOutcome, RoleProber};
