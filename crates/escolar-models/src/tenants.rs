//! Tenant records (schools and education authorities) and the block
//! information surfaced when a tenant vetoes a resolution.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::ids::{AuthorityId, SchoolId, SubjectId};

/// Message shown to authority users whose registration is not yet approved.
pub const PENDING_APPROVAL_MESSAGE: &str = "Registration is awaiting approval";

/// Message shown when a suspended school blocks its members.
pub const SUSPENDED_MESSAGE: &str = "School is suspended";

/// Administrative state of a school tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
    Blocked { reason: Option<String> },
    Inactive,
    Deleted,
}

impl TenantStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TenantStatus::Active)
    }
}

/// Approval state of a municipal or provincial authority registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityStatus {
    Active,
    PendingApproval,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    /// `ativo`: false until the school is activated.
    pub active: bool,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub suspended: bool,
}

impl School {
    /// Status of a school row that exists. A missing row is [`TenantStatus::Deleted`].
    pub fn status(&self) -> TenantStatus {
        if self.blocked {
            let reason = self
                .block_reason
                .as_ref()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty());
            TenantStatus::Blocked { reason }
        } else if self.suspended {
            TenantStatus::Suspended
        } else if !self.active {
            TenantStatus::Inactive
        } else {
            TenantStatus::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    Municipal,
    Provincial,
}

impl AuthorityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorityLevel::Municipal => "municipal",
            AuthorityLevel::Provincial => "provincial",
        }
    }

    pub fn tenant_kind(self) -> TenantKind {
        match self {
            AuthorityLevel::Municipal => TenantKind::DirecaoMunicipal,
            AuthorityLevel::Provincial => TenantKind::DirecaoProvincial,
        }
    }
}

impl TryFrom<String> for AuthorityLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "municipal" => Ok(AuthorityLevel::Municipal),
            "provincial" => Ok(AuthorityLevel::Provincial),
            other => Err(format!("unknown authority level '{}'", other)),
        }
    }
}

/// A municipal or provincial education authority registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EducationAuthority {
    pub id: AuthorityId,
    pub subject_id: Option<SubjectId>,
    #[sqlx(try_from = "String")]
    pub level: AuthorityLevel,
    pub name: String,
    pub province: String,
    pub municipality: Option<String>,
    /// False while the registration awaits approval.
    pub active: bool,
}

impl EducationAuthority {
    pub fn status(&self) -> AuthorityStatus {
        if self.active {
            AuthorityStatus::Active
        } else {
            AuthorityStatus::PendingApproval
        }
    }
}

/// A tenant record that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum Tenant {
    School(School),
    Authority(EducationAuthority),
}

impl Tenant {
    pub fn as_school(&self) -> Option<&School> {
        match self {
            Tenant::School(school) => Some(school),
            Tenant::Authority(_) => None,
        }
    }

    pub fn as_authority(&self) -> Option<&EducationAuthority> {
        match self {
            Tenant::Authority(authority) => Some(authority),
            Tenant::School(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantKind {
    Escola,
    DirecaoMunicipal,
    DirecaoProvincial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Blocked,
    Inactive,
    Deleted,
    PendingApproval,
}

/// Why a resolution was vetoed, rendered by the UI as a blocking modal.
/// Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub kind: BlockKind,
    pub human_reason: Option<String>,
    pub tenant_kind: TenantKind,
}

impl BlockInfo {
    pub fn new(kind: BlockKind, tenant_kind: TenantKind, human_reason: Option<String>) -> Self {
        Self {
            kind,
            human_reason,
            tenant_kind,
        }
    }

    pub fn deleted(tenant_kind: TenantKind) -> Self {
        Self::new(BlockKind::Deleted, tenant_kind, None)
    }

    pub fn pending_approval(tenant_kind: TenantKind) -> Self {
        Self::new(
            BlockKind::PendingApproval,
            tenant_kind,
            Some(PENDING_APPROVAL_MESSAGE.to_string()),
        )
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?})", self.kind, self.tenant_kind)?;
        if let Some(reason) = &self.human_reason {
            write!(f, ": {}", reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school() -> School {
        School {
            id: SchoolId::from_u128(1),
            name: "Escola Primária 14 de Abril".into(),
            active: true,
            blocked: false,
            block_reason: None,
            suspended: false,
        }
    }

    #[test]
    fn test_active_school() {
        assert_eq!(school().status(), TenantStatus::Active);
        assert!(school().status().is_active());
    }

    #[test]
    fn test_blocked_takes_precedence_over_inactive() {
        let s = School {
            active: false,
            blocked: true,
            block_reason: Some(" non-payment ".into()),
            ..school()
        };
        assert_eq!(
            s.status(),
            TenantStatus::Blocked {
                reason: Some("non-payment".into())
            }
        );
    }

    #[test]
    fn test_blank_block_reason_is_none() {
        let s = School {
            blocked: true,
            block_reason: Some("   ".into()),
            ..school()
        };
        assert_eq!(s.status(), TenantStatus::Blocked { reason: None });
    }

    #[test]
    fn test_suspended_and_inactive() {
        let suspended = School {
            suspended: true,
            ..school()
        };
        assert_eq!(suspended.status(), TenantStatus::Suspended);

        let inactive = School {
            active: false,
            ..school()
        };
        assert_eq!(inactive.status(), TenantStatus::Inactive);
    }

    #[test]
    fn test_authority_level_from_string() {
        assert_eq!(
            AuthorityLevel::try_from("provincial".to_string()),
            Ok(AuthorityLevel::Provincial)
        );
        assert!(AuthorityLevel::try_from("national".to_string()).is_err());
    }

    #[test]
    fn test_pending_approval_has_fixed_message() {
        let info = BlockInfo::pending_approval(TenantKind::DirecaoProvincial);
        assert_eq!(info.kind, BlockKind::PendingApproval);
        assert_eq!(info.human_reason.as_deref(), Some(PENDING_APPROVAL_MESSAGE));
    }
}
