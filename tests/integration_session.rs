mod common;

use common::{Fixture, active_school, settled};
use escolar::db::{Fault, Operation};
use escolar::models::{AuthorityLevel, BlockKind, PENDING_APPROVAL_MESSAGE, School, TenantKind};
use escolar::{RefreshOutcome, Role, RoleProfile, SessionConfig, SessionPhase, SessionState};
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_escola_with_active_school_resolves() {
    let fx = Fixture::new();
    let school = active_school();
    let school_id = fx.school(school.clone());
    fx.explicit_profile(Role::Escola, Some(school_id));

    let handle = fx.spawn();
    let state = settled(&handle).await;

    assert_eq!(state.phase(), SessionPhase::Resolved(Role::Escola));
    assert_eq!(state.subject.as_ref(), Some(&fx.subject));
    assert_eq!(state.profile.as_ref().and_then(RoleProfile::school), Some(&school));
    assert!(state.block_reason.is_none());
    assert_eq!(fx.auth.sign_out_count(), 0);
}

#[tokio::test]
async fn test_resolved_state_sets_exactly_one_role() {
    for role in Role::ALL {
        let fx = Fixture::new();
        let school_id = fx.school(active_school());
        match role {
            Role::DirecaoMunicipal => {
                let authority_id = fx.authority(AuthorityLevel::Municipal, true);
                fx.authority_profile(role, authority_id);
            }
            Role::DirecaoProvincial => {
                let authority_id = fx.authority(AuthorityLevel::Provincial, true);
                fx.authority_profile(role, authority_id);
            }
            Role::Encarregado => {
                fx.explicit_profile(role, None);
                fx.student_of(school_id, Some(fx.subject.id));
            }
            _ => {
                fx.explicit_profile(role, Some(school_id));
            }
        }

        let handle = fx.spawn();
        let state = settled(&handle).await;

        assert_eq!(state.role, role);
        assert_eq!(state.flags().count_set(), 1, "{} set more than one flag", role);
        assert_eq!(state.profile.as_ref().map(RoleProfile::role), Some(role));
    }
}

#[tokio::test]
async fn test_blocked_school_blocks_teacher_found_by_email() {
    let fx = Fixture::new();
    let school_id = fx.school(School {
        blocked: true,
        block_reason: Some("non-payment".into()),
        ..active_school()
    });
    let teacher_id = fx.orphaned_teacher(school_id);

    let handle = fx.spawn();
    let state = settled(&handle).await;

    let block = state.block_reason.clone().expect("blocked state");
    assert_eq!(block.kind, BlockKind::Blocked);
    assert_eq!(block.human_reason.as_deref(), Some("non-payment"));
    assert_eq!(block.tenant_kind, TenantKind::Escola);
    assert_eq!(state.role, Role::Unresolved);
    assert!(state.profile.is_none());

    assert_eq!(fx.auth.sign_out_count(), 1);
    assert!(!fx.auth.is_signed_in());
    assert_eq!(
        fx.repo.teacher(teacher_id).and_then(|t| t.subject_id),
        Some(fx.subject.id)
    );
}

#[tokio::test]
async fn test_unknown_subject_is_signed_out() {
    let fx = Fixture::new();

    let handle = fx.spawn();
    let state = settled(&handle).await;

    assert_eq!(state, SessionState::unresolved(None));
    assert_eq!(fx.auth.sign_out_count(), 1);
}

#[tokio::test]
async fn test_pending_provincial_authority_blocks_with_fixed_message() {
    let fx = Fixture::new();
    fx.authority(AuthorityLevel::Provincial, false);

    let handle = fx.spawn();
    let state = settled(&handle).await;

    let block = state.block_reason.expect("blocked state");
    assert_eq!(block.kind, BlockKind::PendingApproval);
    assert_eq!(block.tenant_kind, TenantKind::DirecaoProvincial);
    assert_eq!(block.human_reason.as_deref(), Some(PENDING_APPROVAL_MESSAGE));
    assert_eq!(fx.auth.sign_out_count(), 1);
}

#[tokio::test]
async fn test_canonical_probe_error_keeps_minimal_identity() {
    let fx = Fixture::new();
    let school_id = fx.school(active_school());
    fx.enrolled(school_id);
    fx.repo.fail(Operation::ActiveProfile, Fault::Unavailable);

    let handle = fx.spawn();
    let state = settled(&handle).await;

    assert_eq!(state, SessionState::unresolved(Some(fx.subject.clone())));
    assert_eq!(fx.auth.sign_out_count(), 0);
    assert_eq!(fx.repo.call_count(Operation::StudentBySubject), 0);
}

#[tokio::test(start_paused = true)]
async fn test_two_token_refreshes_run_once() {
    let fx = Fixture::new();
    fx.explicit_profile(Role::Superadmin, None);
    fx.repo.set_latency(Some(Duration::from_millis(50)));

    let handle = fx.spawn();
    let first = settled(&handle).await;
    fx.repo.reset_calls();

    fx.auth.refresh_token();
    fx.auth.refresh_token();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fx.repo.call_count(Operation::ActiveProfile), 1);
    assert_eq!(handle.state(), first);
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_sign_ins_start_one_run() {
    let fx = Fixture::signed_out();
    fx.explicit_profile(Role::Superadmin, None);
    fx.repo.set_latency(Some(Duration::from_millis(50)));

    let handle = fx.spawn();
    assert_eq!(settled(&handle).await, SessionState::unresolved(None));

    fx.auth.sign_in(fx.subject.clone());
    fx.auth.sign_in(fx.subject.clone());
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fx.repo.calls(), vec![Operation::ActiveProfile]);
    assert_eq!(handle.state().role, Role::Superadmin);
}

#[tokio::test]
async fn test_refresh_twice_is_idempotent() {
    let fx = Fixture::new();
    let school_id = fx.school(active_school());
    fx.registrar(school_id);

    let handle = fx.spawn();
    let initial = settled(&handle).await;
    assert_eq!(initial.role, Role::Secretario);

    assert_eq!(assert_ok!(handle.refresh().await), RefreshOutcome::Started);
    let once = settled(&handle).await;
    assert_eq!(assert_ok!(handle.refresh().await), RefreshOutcome::Started);
    let twice = settled(&handle).await;

    assert_eq!(once, twice);
    assert_eq!(once.role, Role::Secretario);
}

#[tokio::test]
async fn test_orphaned_teacher_found_by_id_after_repair() {
    let fx = Fixture::new();
    let school_id = fx.school(active_school());
    fx.orphaned_teacher(school_id);

    let handle = fx.spawn();
    assert_eq!(settled(&handle).await.role, Role::Professor);

    fx.repo.reset_calls();
    assert_ok!(handle.refresh().await);
    let state = settled(&handle).await;

    assert_eq!(state.role, Role::Professor);
    assert_eq!(fx.repo.call_count(Operation::TeacherBySubject), 1);
    assert_eq!(fx.repo.call_count(Operation::TeacherByEmail), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_repository_stops_loading_within_timeout() {
    let fx = Fixture::new();
    fx.explicit_profile(Role::Superadmin, None);
    fx.repo.fail(Operation::ActiveProfile, Fault::Stall);
    let timeout = Duration::from_secs(5);

    let started = Instant::now();
    let handle = fx.spawn_with(SessionConfig::default().with_safety_timeout(timeout));
    let state = settled(&handle).await;

    assert!(started.elapsed() <= timeout + Duration::from_millis(10));
    assert_eq!(state.role, Role::Unresolved);
    assert_eq!(state.subject.as_ref(), Some(&fx.subject));

    // The guard was released: the next trigger starts a run.
    fx.repo.clear_fault(Operation::ActiveProfile);
    assert_eq!(assert_ok!(handle.refresh().await), RefreshOutcome::Started);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_event_keeps_block_reason() {
    let fx = Fixture::new();
    let school_id = fx.school(School {
        active: false,
        ..active_school()
    });
    fx.explicit_profile(Role::Aluno, Some(school_id));

    let handle = fx.spawn();
    let blocked = settled(&handle).await;
    assert_eq!(blocked.phase(), SessionPhase::Blocked);

    fx.auth.expire();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(handle.state().block_reason, blocked.block_reason);
    assert!(handle.state().subject.is_none());
}

#[tokio::test]
async fn test_explicit_sign_out_publishes_empty_state() {
    let fx = Fixture::new();
    fx.explicit_profile(Role::Superadmin, None);

    let handle = fx.spawn();
    assert_eq!(settled(&handle).await.role, Role::Superadmin);

    assert_ok!(handle.sign_out().await);

    assert_eq!(handle.state(), SessionState::empty());
    assert_eq!(fx.auth.sign_out_count(), 1);
    assert!(!fx.auth.is_signed_in());
}

#[tokio::test]
async fn test_sign_in_after_sign_out_resolves_again() {
    let fx = Fixture::new();
    fx.explicit_profile(Role::Superadmin, None);

    let handle = fx.spawn();
    settled(&handle).await;
    assert_ok!(handle.sign_out().await);

    let mut states = handle.subscribe();
    fx.auth.sign_in(fx.subject.clone());
    let state = states
        .wait_for(|s| s.role == Role::Superadmin && !s.is_loading)
        .await
        .map(|s| s.clone());

    assert_eq!(assert_ok!(state).subject, Some(fx.subject.clone()));
}
