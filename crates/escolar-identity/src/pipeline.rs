use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use escolar_db::{Repository, RepositoryError};
use escolar_models::{BlockInfo, BlockKind, RoleProfile, Subject};
use escolar_observability::{track_pipeline_duration, track_resolution, track_tenant_block};

use crate::enrich::ProfileEnricher;
use crate::gate::{GateOutcome, TenantResolver, gate};
use crate::prober::{ResolutionOutcome, RoleProber};

/// Terminal result of one probe, gate and enrich run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Resolved(RoleProfile),
    /// The tenant vetoed the role; the caller must sign the subject out.
    Blocked(BlockInfo),
    /// No probe matched; the caller must sign the subject out.
    NotFound,
    /// The canonical probe or the tenant lookup failed.
    Failed(RepositoryError),
}

impl PipelineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineOutcome::Resolved(_) => "resolved",
            PipelineOutcome::Blocked(_) => "blocked",
            PipelineOutcome::NotFound => "not_found",
            PipelineOutcome::Failed(_) => "error",
        }
    }

    pub fn requires_sign_out(&self) -> bool {
        matches!(self, PipelineOutcome::Blocked(_) | PipelineOutcome::NotFound)
    }
}

pub struct IdentityPipeline {
    prober: RoleProber,
    tenants: TenantResolver,
    enricher: ProfileEnricher,
}

impl IdentityPipeline {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            prober: RoleProber::new(repo.clone()),
            tenants: TenantResolver::new(repo.clone()),
            enricher: ProfileEnricher::new(repo),
        }
    }

    #[instrument(skip(self, subject), fields(subject.id = %subject.id))]
    pub async fn run(&self, subject: &Subject) -> PipelineOutcome {
        let started = Instant::now();
        let outcome = self.stages(subject).await;

        track_pipeline_duration(started.elapsed().as_secs_f64());
        track_resolution(outcome.as_str());
        outcome
    }

    async fn stages(&self, subject: &Subject) -> PipelineOutcome {
        let (role, mut link) = match self.prober.resolve(subject).await {
            ResolutionOutcome::Found { role, link, .. } => (role, link),
            ResolutionOutcome::NotFound => {
                info!("Subject matches no role");
                return PipelineOutcome::NotFound;
            }
            ResolutionOutcome::RepositoryError { cause } => return PipelineOutcome::Failed(cause),
        };

        let tenant_ref = match self.tenants.resolve(role, &mut link).await {
            Ok(tenant_ref) => tenant_ref,
            Err(cause) => {
                warn!(%role, error = %cause, "Tenant lookup failed");
                return PipelineOutcome::Failed(cause);
            }
        };

        let tenant = match gate(role, &tenant_ref) {
            GateOutcome::Pass { tenant } => tenant,
            GateOutcome::Block(info) => {
                info!(%role, block = %info, "Tenant blocked resolution");
                track_tenant_block(block_kind_label(&info));
                return PipelineOutcome::Blocked(info);
            }
        };

        match self.enricher.enrich(subject, role, link, tenant).await {
            Some(profile) => {
                info!(%role, "Subject resolved");
                PipelineOutcome::Resolved(profile)
            }
            None => PipelineOutcome::NotFound,
        }
    }
}

fn block_kind_label(info: &BlockInfo) -> &'static str {
    match info.kind {
        BlockKind::Blocked => "blocked",
        BlockKind::Inactive => "inactive",
        BlockKind::Deleted => "deleted",
        BlockKind::PendingApproval => "pending_approval",
    }
}
