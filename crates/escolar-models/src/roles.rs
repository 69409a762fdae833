//! The closed set of role types a subject can resolve to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a subject resolves to.
///
/// `Unresolved` is never stored; it is the role of an empty, loading, blocked
/// or unknown session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Institution (school) administrator.
    Escola,
    /// Teacher.
    Professor,
    /// Student.
    Aluno,
    /// Guardian of one or more students.
    Encarregado,
    /// School registrar.
    Secretario,
    /// Municipal education authority.
    DirecaoMunicipal,
    /// Provincial education authority.
    DirecaoProvincial,
    /// Global super-administrator, bound to no tenant.
    Superadmin,
    #[default]
    Unresolved,
}

/// Which kind of tenant record gates a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantBinding {
    School,
    MunicipalAuthority,
    ProvincialAuthority,
    None,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Escola,
        Role::Professor,
        Role::Aluno,
        Role::Encarregado,
        Role::Secretario,
        Role::DirecaoMunicipal,
        Role::DirecaoProvincial,
        Role::Superadmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Escola => "escola",
            Role::Professor => "professor",
            Role::Aluno => "aluno",
            Role::Encarregado => "encarregado",
            Role::Secretario => "secretario",
            Role::DirecaoMunicipal => "direcao_municipal",
            Role::DirecaoProvincial => "direcao_provincial",
            Role::Superadmin => "superadmin",
            Role::Unresolved => "unresolved",
        }
    }

    pub fn binding(self) -> TenantBinding {
        match self {
            Role::Escola | Role::Professor | Role::Aluno | Role::Encarregado | Role::Secretario => {
                TenantBinding::School
            }
            Role::DirecaoMunicipal => TenantBinding::MunicipalAuthority,
            Role::DirecaoProvincial => TenantBinding::ProvincialAuthority,
            Role::Superadmin | Role::Unresolved => TenantBinding::None,
        }
    }

    pub fn is_school_bound(self) -> bool {
        self.binding() == TenantBinding::School
    }

    pub fn is_authority_bound(self) -> bool {
        matches!(
            self.binding(),
            TenantBinding::MunicipalAuthority | TenantBinding::ProvincialAuthority
        )
    }

    /// Whether resolution must pass the tenant gate before surfacing.
    pub fn requires_gate(self) -> bool {
        self.binding() != TenantBinding::None
    }

    pub fn is_resolved(self) -> bool {
        self != Role::Unresolved
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parses a stored role name. `unresolved` is not a storable role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
