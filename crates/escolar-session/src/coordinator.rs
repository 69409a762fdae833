//! The session actor.
//!
//! One task owns the published [`SessionState`], the re-entrancy guard and
//! the initial-check latch. Handles talk to it through [`ToSessionActor`]
//! messages, the auth provider through its event stream, and pipeline runs
//! through [`RunReport`]s. Every mutation happens inside [`SessionActor::run`].

use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use escolar_auth::{AuthError, AuthEvent, AuthEventKind, AuthProvider};
use escolar_config::SessionConfig;
use escolar_db::Repository;
use escolar_identity::{IdentityPipeline, PipelineOutcome};
use escolar_models::{SessionState, Subject};
use escolar_observability::{track_safety_timeout, track_trigger_dropped};

use crate::error::SessionError;
use crate::handle::SessionHandle;

/// Whether a trigger started a pipeline run or was dropped by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started,
    Dropped,
}

#[derive(Debug)]
pub(crate) enum ToSessionActor {
    Refresh {
        reply: oneshot::Sender<RefreshOutcome>,
    },
    SignOut {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Shutdown,
}

impl fmt::Display for ToSessionActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToSessionActor::Refresh { .. } => write!(f, "refresh the current subject"),
            ToSessionActor::SignOut { .. } => write!(f, "sign out"),
            ToSessionActor::Shutdown => write!(f, "shutdown the actor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Initial,
    SignedIn,
    TokenRefreshed,
    Refresh,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Initial => "initial",
            Trigger::SignedIn => "signed_in",
            Trigger::TokenRefreshed => "token_refreshed",
            Trigger::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages from spawned pipeline runs back to the actor.
#[derive(Debug)]
enum RunReport {
    /// The run asked the provider for the current subject.
    SubjectLooked {
        run_id: u64,
        subject: Option<Subject>,
    },
    Finished {
        run_id: u64,
        epoch: u64,
        outcome: RunOutcome,
    },
}

#[derive(Debug)]
enum RunOutcome {
    NoSubject,
    LookupFailed(AuthError),
    Pipeline {
        subject: Subject,
        outcome: PipelineOutcome,
    },
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    trigger: Trigger,
    subject: Option<Subject>,
}

pub struct SessionCoordinator;

impl SessionCoordinator {
    /// Starts the actor and its initial check. Must be called inside a tokio runtime.
    pub fn spawn(
        repo: Arc<dyn Repository>,
        auth: Arc<dyn AuthProvider>,
        config: SessionConfig,
    ) -> SessionHandle {
        let (commands_tx, inbox) = mpsc::channel(config.command_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::initial());
        let (reports_tx, reports) = mpsc::unbounded_channel();

        // Subscribe before the initial lookup so no event slips between the two.
        let events = auth.subscribe();

        let mut actor = SessionActor {
            pipeline: Arc::new(IdentityPipeline::new(repo)),
            auth,
            config,
            state: state_tx,
            inbox,
            events,
            events_open: true,
            reports_tx,
            reports,
            in_flight: None,
            latest_run: 0,
            epoch: 0,
            deadline: None,
            initial_check_complete: false,
            first_event_seen: false,
        };

        actor.trigger(None, Trigger::Initial);
        tokio::spawn(actor.run());

        SessionHandle::new(commands_tx, state_rx)
    }
}

struct SessionActor {
    pipeline: Arc<IdentityPipeline>,
    auth: Arc<dyn AuthProvider>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    inbox: mpsc::Receiver<ToSessionActor>,
    events: broadcast::Receiver<AuthEvent>,
    events_open: bool,
    reports_tx: mpsc::UnboundedSender<RunReport>,
    reports: mpsc::UnboundedReceiver<RunReport>,
    /// Re-entrancy guard.
    in_flight: Option<InFlight>,
    latest_run: u64,
    /// Bumped by every sign-out; results from an older epoch are discarded.
    epoch: u64,
    /// Safety-timeout deadline, armed while loading.
    deadline: Option<Instant>,
    initial_check_complete: bool,
    first_event_seen: bool,
}

impl SessionActor {
    async fn run(mut self) {
        loop {
            let deadline = self.deadline;

            // Reports go first so the initial-check latch is set before any
            // event queued behind the lookup is seen.
            tokio::select! {
                biased;

                Some(report) = self.reports.recv() => self.on_run_report(report).await,
                msg = self.inbox.recv() => {
                    let Some(msg) = msg else { break };
                    if !self.on_actor_message(msg).await {
                        break;
                    }
                }
                event = self.events.recv(), if self.events_open => {
                    match event {
                        Ok(event) => self.on_auth_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Auth event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("Auth event stream closed");
                            self.events_open = false;
                        }
                    }
                }
                _ = wait_for_deadline(deadline) => self.on_safety_timeout(),
            }
        }

        debug!("Session actor stopped");
    }

    async fn on_actor_message(&mut self, msg: ToSessionActor) -> bool {
        debug!("{msg}");

        match msg {
            ToSessionActor::Refresh { reply } => {
                let subject = self.state.borrow().subject.clone();
                let outcome = self.trigger(subject, Trigger::Refresh);
                let _ = reply.send(outcome);
            }
            ToSessionActor::SignOut { reply } => {
                self.reset_for_sign_out();
                let result = self.sign_out_provider().await;
                self.publish(SessionState::empty());
                let _ = reply.send(result);
            }
            ToSessionActor::Shutdown => return false,
        }

        true
    }

    fn on_auth_event(&mut self, event: AuthEvent) {
        let first = !self.first_event_seen;
        self.first_event_seen = true;

        if first && !self.initial_check_complete && event.triggers_resolution() {
            debug!(%event, "Suppressing first event, the initial check covers it");
            return;
        }

        match (event.kind, event.subject) {
            (AuthEventKind::SignedOut, _) => {
                info!("Auth provider signed out");
                self.reset_for_sign_out();
                let state = self.state.borrow().signed_out();
                self.publish(state);
            }
            (AuthEventKind::SignedIn, Some(subject)) => {
                self.trigger(Some(subject), Trigger::SignedIn);
            }
            (AuthEventKind::TokenRefreshed, Some(subject)) => {
                self.trigger(Some(subject), Trigger::TokenRefreshed);
            }
            (kind, None) => warn!(?kind, "Ignoring auth event without a subject"),
        }
    }

    /// Starts a pipeline run unless one is already in flight. Without a
    /// subject the run asks the provider for the current one first.
    fn trigger(&mut self, subject: Option<Subject>, trigger: Trigger) -> RefreshOutcome {
        if let Some(run) = &self.in_flight {
            debug!(run_id = run.id, %trigger, "Resolution already running, dropping trigger");
            track_trigger_dropped(trigger.as_str());
            return RefreshOutcome::Dropped;
        }

        self.latest_run += 1;
        let run_id = self.latest_run;
        let epoch = self.epoch;

        self.in_flight = Some(InFlight {
            id: run_id,
            trigger,
            subject: subject.clone(),
        });
        self.deadline = Some(Instant::now() + self.config.safety_timeout);
        let loading = self.state.borrow().begin_loading();
        self.publish(loading);

        debug!(run_id, %trigger, "Starting resolution");

        let pipeline = self.pipeline.clone();
        let auth = self.auth.clone();
        let reports = self.reports_tx.clone();

        tokio::spawn(async move {
            let subject = match subject {
                Some(subject) => Ok(Some(subject)),
                None => {
                    let looked = auth.current_subject().await;
                    let _ = reports.send(RunReport::SubjectLooked {
                        run_id,
                        subject: looked.as_ref().ok().cloned().flatten(),
                    });
                    looked
                }
            };

            let outcome = match subject {
                Ok(None) => RunOutcome::NoSubject,
                Err(e) => RunOutcome::LookupFailed(e),
                Ok(Some(subject)) => {
                    let outcome = pipeline.run(&subject).await;
                    RunOutcome::Pipeline { subject, outcome }
                }
            };

            // The actor may have stopped; nothing left to report to.
            let _ = reports.send(RunReport::Finished {
                run_id,
                epoch,
                outcome,
            });
        });

        RefreshOutcome::Started
    }

    async fn on_run_report(&mut self, report: RunReport) {
        match report {
            RunReport::SubjectLooked { run_id, subject } => {
                if let Some(run) = self.in_flight.as_mut().filter(|run| run.id == run_id) {
                    if run.trigger == Trigger::Initial {
                        self.initial_check_complete = true;
                    }
                    run.subject = subject;
                }
            }
            RunReport::Finished {
                run_id,
                epoch,
                outcome,
            } => {
                if run_id != self.latest_run || epoch != self.epoch {
                    debug!(run_id, epoch, "Discarding stale resolution result");
                    return;
                }

                self.complete_run(run_id);
                let state = self.settle(outcome).await;
                self.publish(state);
            }
        }
    }

    /// Maps a run outcome to the state to publish, signing the subject out
    /// first when the outcome demands it.
    async fn settle(&mut self, outcome: RunOutcome) -> SessionState {
        match outcome {
            RunOutcome::NoSubject => {
                debug!("No current subject");
                SessionState::unresolved(None)
            }
            RunOutcome::LookupFailed(e) => {
                warn!(error = %e, "Failed to read the current subject");
                SessionState::unresolved(None)
            }
            RunOutcome::Pipeline { subject, outcome } => match outcome {
                PipelineOutcome::Resolved(profile) => SessionState::resolved(subject, profile),
                PipelineOutcome::Blocked(info) => {
                    self.force_sign_out(&subject).await;
                    SessionState::blocked(info)
                }
                PipelineOutcome::NotFound => {
                    self.force_sign_out(&subject).await;
                    SessionState::unresolved(None)
                }
                PipelineOutcome::Failed(cause) => {
                    warn!(subject.id = %subject.id, error = %cause, "Resolution failed, keeping minimal identity");
                    SessionState::unresolved(Some(subject))
                }
            },
        }
    }

    fn on_safety_timeout(&mut self) {
        self.deadline = None;
        let Some(run) = self.in_flight.take() else {
            return;
        };

        warn!(
            run_id = run.id,
            timeout = ?self.config.safety_timeout,
            "Resolution exceeded the safety timeout, forcing unresolved"
        );
        track_safety_timeout();

        if run.trigger == Trigger::Initial {
            self.initial_check_complete = true;
        }
        self.publish(SessionState::unresolved(run.subject));
    }

    /// Clears the guard and deadline and invalidates in-flight results.
    fn reset_for_sign_out(&mut self) {
        self.epoch += 1;
        if let Some(run) = self.in_flight.take() {
            debug!(run_id = run.id, "Sign-out superseded the running resolution");
            if run.trigger == Trigger::Initial {
                self.initial_check_complete = true;
            }
        }
        self.deadline = None;
    }

    fn complete_run(&mut self, run_id: u64) {
        if self.in_flight.as_ref().is_some_and(|run| run.id == run_id) {
            self.in_flight = None;
            self.deadline = None;
        }
    }

    async fn force_sign_out(&self, subject: &Subject) {
        match self.sign_out_provider().await {
            Ok(()) => info!(subject.id = %subject.id, "Forced sign-out"),
            Err(e) => warn!(subject.id = %subject.id, error = %e, "Forced sign-out failed"),
        }
    }

    async fn sign_out_provider(&self) -> Result<(), SessionError> {
        let timeout = self.config.sign_out_timeout;
        match tokio::time::timeout(timeout, self.auth.sign_out()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::SignOutTimedOut(timeout)),
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escolar_auth::ChannelAuthProvider;
    use escolar_db::{Fault, MemoryRepository, Operation};
    use escolar_models::{Email, ProfileId, ProfileRecord, Role, SubjectId};
    use std::time::Duration;

    fn subject() -> Subject {
        Subject::new(SubjectId::from_u128(1), Email::new_unchecked("admin@escolar.ao"))
    }

    fn superadmin_repo(subject: &Subject) -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert_profile(ProfileRecord {
            id: ProfileId::from_u128(10),
            subject_id: subject.id,
            role: "superadmin".into(),
            school_id: None,
            authority_id: None,
            display_name: None,
            active: true,
        });
        repo
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_event_during_initial_check_is_suppressed() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        let auth = Arc::new(ChannelAuthProvider::new());
        let hold = auth.hold_current_subject();

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), SessionConfig::default());
        auth.sign_in(subject.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        hold.release();

        let state = handle.wait_until(|s| !s.is_loading).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(state.role, Role::Superadmin);
        assert_eq!(repo.call_count(Operation::ActiveProfile), 1);
        assert_eq!(auth.current_subject_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_after_completed_lookup_is_not_suppressed() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        let auth = Arc::new(ChannelAuthProvider::new());

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), SessionConfig::default());
        // Queued before the actor first runs, behind the initial lookup's report.
        auth.sign_in(subject.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(handle.state().role, Role::Superadmin);
        assert_eq!(auth.current_subject_calls(), 1);
        assert_eq!(repo.call_count(Operation::ActiveProfile), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_event_discards_in_flight_result() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        repo.set_latency(Some(Duration::from_secs(1)));
        let auth = Arc::new(ChannelAuthProvider::with_subject(subject.clone()));

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), SessionConfig::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.state().is_loading);

        auth.expire();
        let state = handle.wait_until(|s| !s.is_loading).await.unwrap();
        assert_eq!(state, SessionState::empty());

        // Let the stale run finish; it must not be published.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.state(), SessionState::empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_while_running_is_dropped() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        repo.set_latency(Some(Duration::from_secs(1)));
        let auth = Arc::new(ChannelAuthProvider::with_subject(subject.clone()));

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), SessionConfig::default());

        assert_eq!(handle.refresh().await.unwrap(), RefreshOutcome::Dropped);
        handle.wait_until(|s| !s.is_loading).await.unwrap();
        assert_eq!(handle.refresh().await.unwrap(), RefreshOutcome::Started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_after_timeout_is_applied() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        repo.set_latency(Some(Duration::from_secs(3)));
        let auth = Arc::new(ChannelAuthProvider::with_subject(subject.clone()));
        let config = SessionConfig::default().with_safety_timeout(Duration::from_secs(1));

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), config);

        let timed_out = handle.wait_until(|s| !s.is_loading).await.unwrap();
        assert_eq!(timed_out.role, Role::Unresolved);
        assert_eq!(timed_out.subject, Some(subject.clone()));

        let late = handle.wait_until(|s| s.role.is_resolved()).await.unwrap();
        assert_eq!(late.role, Role::Superadmin);
    }

    #[tokio::test]
    async fn test_explicit_sign_out_clears_state_even_if_provider_fails() {
        let subject = subject();
        let repo = superadmin_repo(&subject);
        let auth = Arc::new(ChannelAuthProvider::with_subject(subject.clone()));
        auth.set_sign_out_failure(true);

        let handle = SessionCoordinator::spawn(repo.clone(), auth.clone(), SessionConfig::default());
        handle.wait_until(|s| s.role.is_resolved()).await.unwrap();

        let result = handle.sign_out().await;

        assert!(matches!(result, Err(SessionError::SignOut(_))));
        assert_eq!(handle.state(), SessionState::empty());
    }

    #[tokio::test]
    async fn test_commands_fail_after_shutdown() {
        let auth = Arc::new(ChannelAuthProvider::new());
        let repo = Arc::new(MemoryRepository::new());
        repo.fail(Operation::ActiveProfile, Fault::Unavailable);

        let handle = SessionCoordinator::spawn(repo, auth, SessionConfig::default());
        handle.wait_until(|s| !s.is_loading).await.unwrap();
        handle.shutdown().await.unwrap();

        assert!(matches!(handle.refresh().await, Err(SessionError::Closed)));
    }
}
