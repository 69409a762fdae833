//! Tenant gating.
//!
//! [`TenantResolver`] loads the tenant record a role is bound to; [`gate`]
//! decides, without side effects, whether that tenant lets the role through.

use std::sync::Arc;
use tracing::{debug, instrument};

use escolar_db::{Repository, RepositoryResult};
use escolar_models::{
    AuthorityLevel, AuthorityStatus, BlockInfo, BlockKind, EducationAuthority, Role, School,
    SchoolId, SUSPENDED_MESSAGE, Tenant, TenantBinding, TenantKind, TenantStatus,
};

use crate::prober::LinkData;

/// The tenant record a found role points at, as far as it could be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantRef {
    /// The role has no tenant to check.
    Unbound,
    /// `None` when the link carries no school id or the row is gone.
    School(Option<School>),
    Authority {
        level: AuthorityLevel,
        record: Option<EducationAuthority>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Pass { tenant: Option<Tenant> },
    Block(BlockInfo),
}

impl GateOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateOutcome::Pass { .. })
    }
}

/// Decides whether `role` may surface given its tenant.
pub fn gate(role: Role, tenant: &TenantRef) -> GateOutcome {
    if !role.requires_gate() {
        return GateOutcome::Pass { tenant: None };
    }

    match tenant {
        TenantRef::Unbound => GateOutcome::Pass { tenant: None },
        TenantRef::School(None) => GateOutcome::Block(BlockInfo::deleted(TenantKind::Escola)),
        TenantRef::School(Some(school)) => gate_school(school),
        TenantRef::Authority {
            level,
            record: None,
        } => GateOutcome::Block(BlockInfo::deleted(level.tenant_kind())),
        TenantRef::Authority {
            level,
            record: Some(authority),
        } => match authority.status() {
            AuthorityStatus::Active => GateOutcome::Pass {
                tenant: Some(Tenant::Authority(authority.clone())),
            },
            AuthorityStatus::PendingApproval => {
                GateOutcome::Block(BlockInfo::pending_approval(level.tenant_kind()))
            }
            AuthorityStatus::Deleted => GateOutcome::Block(BlockInfo::deleted(level.tenant_kind())),
        },
    }
}

fn gate_school(school: &School) -> GateOutcome {
    let block = |kind, reason| GateOutcome::Block(BlockInfo::new(kind, TenantKind::Escola, reason));

    match school.status() {
        TenantStatus::Active => GateOutcome::Pass {
            tenant: Some(Tenant::School(school.clone())),
        },
        TenantStatus::Blocked { reason } => block(BlockKind::Blocked, reason),
        TenantStatus::Suspended => block(BlockKind::Inactive, Some(SUSPENDED_MESSAGE.to_string())),
        TenantStatus::Inactive => block(BlockKind::Inactive, None),
        TenantStatus::Deleted => block(BlockKind::Deleted, None),
    }
}

/// Loads the tenant for a found role.
pub struct TenantResolver {
    repo: Arc<dyn Repository>,
}

impl TenantResolver {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Guardians are keyed on their first dependent's school; a guardian
    /// with no dependents is unbound. A guardian found through an explicit
    /// profile has its dependents loaded here and `link` becomes
    /// [`LinkData::Guardian`], so enrichment reuses them.
    #[instrument(skip(self, link))]
    pub async fn resolve(&self, role: Role, link: &mut LinkData) -> RepositoryResult<TenantRef> {
        match role.binding() {
            TenantBinding::None => Ok(TenantRef::Unbound),
            TenantBinding::School => {
                if role == Role::Encarregado {
                    if let LinkData::Profile(profile) = link {
                        let dependents = self.repo.find_dependents(profile.subject_id).await?;
                        *link = LinkData::Guardian { dependents };
                    }
                }

                let school_id = match &*link {
                    LinkData::Guardian { dependents } => match dependents.first() {
                        Some(first) => first.school_id,
                        None => return Ok(TenantRef::Unbound),
                    },
                    link => link_school_id(link),
                };
                self.load_school(school_id).await
            }
            TenantBinding::MunicipalAuthority => {
                self.load_authority(AuthorityLevel::Municipal, &*link).await
            }
            TenantBinding::ProvincialAuthority => {
                self.load_authority(AuthorityLevel::Provincial, &*link).await
            }
        }
    }

    async fn load_school(&self, school_id: Option<SchoolId>) -> RepositoryResult<TenantRef> {
        let Some(school_id) = school_id else {
            debug!("Link has no school");
            return Ok(TenantRef::School(None));
        };
        Ok(TenantRef::School(self.repo.find_school(school_id).await?))
    }

    async fn load_authority(
        &self,
        level: AuthorityLevel,
        link: &LinkData,
    ) -> RepositoryResult<TenantRef> {
        let record = match link {
            LinkData::PendingAuthority(authority) => Some(authority.clone()),
            LinkData::Profile(profile) => match profile.authority_id {
                Some(id) => self.repo.find_authority(id, level).await?,
                None => None,
            },
            _ => None,
        };
        Ok(TenantRef::Authority { level, record })
    }
}

fn link_school_id(link: &LinkData) -> Option<SchoolId> {
    match link {
        LinkData::Profile(profile) => profile.school_id,
        LinkData::Teacher(teacher) => teacher.school_id,
        LinkData::Student(student) => student.school_id,
        LinkData::Registrar(registrar) => registrar.school_id,
        LinkData::Guardian { dependents } => dependents.first().and_then(|d| d.school_id),
        LinkData::PendingAuthority(_) => None,
    }
}
