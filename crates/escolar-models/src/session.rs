//! The observable session value published by the coordinator.

use serde::{Deserialize, Serialize};

use crate::profiles::RoleProfile;
use crate::roles::Role;
use crate::subject::Subject;
use crate::tenants::BlockInfo;

/// Coarse phase derived from a [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "role", rename_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Resolved(Role),
    Unresolved,
    Blocked,
}

/// One boolean per role, the shape UI code usually consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    pub is_escola: bool,
    pub is_professor: bool,
    pub is_aluno: bool,
    pub is_encarregado: bool,
    pub is_secretario: bool,
    pub is_direcao_municipal: bool,
    pub is_direcao_provincial: bool,
    pub is_superadmin: bool,
}

impl RoleFlags {
    pub fn count_set(&self) -> usize {
        [
            self.is_escola,
            self.is_professor,
            self.is_aluno,
            self.is_encarregado,
            self.is_secretario,
            self.is_direcao_municipal,
            self.is_direcao_provincial,
            self.is_superadmin,
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl From<Role> for RoleFlags {
    fn from(role: Role) -> Self {
        let mut flags = RoleFlags::default();
        match role {
            Role::Escola => flags.is_escola = true,
            Role::Professor => flags.is_professor = true,
            Role::Aluno => flags.is_aluno = true,
            Role::Encarregado => flags.is_encarregado = true,
            Role::Secretario => flags.is_secretario = true,
            Role::DirecaoMunicipal => flags.is_direcao_municipal = true,
            Role::DirecaoProvincial => flags.is_direcao_provincial = true,
            Role::Superadmin => flags.is_superadmin = true,
            Role::Unresolved => {}
        }
        flags
    }
}

/// Published result of identity resolution.
///
/// Only the session coordinator constructs and replaces these. A resolved
/// state is built from a [`RoleProfile`] so its role and profile cannot
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub subject: Option<Subject>,
    pub role: Role,
    pub profile: Option<RoleProfile>,
    pub is_loading: bool,
    pub block_reason: Option<BlockInfo>,
}

impl SessionState {
    /// State at process start, before the first check completes.
    pub fn initial() -> Self {
        Self {
            is_loading: true,
            ..Self::empty()
        }
    }

    pub fn empty() -> Self {
        Self {
            subject: None,
            role: Role::Unresolved,
            profile: None,
            is_loading: false,
            block_reason: None,
        }
    }

    pub fn resolved(subject: Subject, profile: RoleProfile) -> Self {
        Self {
            subject: Some(subject),
            role: profile.role(),
            profile: Some(profile),
            is_loading: false,
            block_reason: None,
        }
    }

    /// Unresolved state, optionally keeping the subject as a minimal identity.
    pub fn unresolved(subject: Option<Subject>) -> Self {
        Self {
            subject,
            ..Self::empty()
        }
    }

    pub fn blocked(info: BlockInfo) -> Self {
        Self {
            block_reason: Some(info),
            ..Self::empty()
        }
    }

    /// Same state with the loading flag raised; the previous values stay
    /// visible until the run finishes.
    pub fn begin_loading(&self) -> Self {
        Self {
            is_loading: true,
            ..self.clone()
        }
    }

    /// Clears identity, role and profile but keeps a block reason on screen.
    pub fn signed_out(&self) -> Self {
        Self {
            block_reason: self.block_reason.clone(),
            ..Self::empty()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if self.block_reason.is_some() {
            SessionPhase::Blocked
        } else if self.role.is_resolved() {
            SessionPhase::Resolved(self.role)
        } else {
            SessionPhase::Unresolved
        }
    }

    pub fn flags(&self) -> RoleFlags {
        RoleFlags::from(self.role)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
