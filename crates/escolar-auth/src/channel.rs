//! In-process auth provider backed by a broadcast channel.
//!
//! The host application (or a test) drives it directly: [`sign_in`],
//! [`refresh_token`] and [`expire`] update the current subject and emit the
//! matching [`AuthEvent`]. Sign-outs requested by the session coordinator are
//! counted so callers can assert a forced sign-out happened.
//!
//! [`sign_in`]: ChannelAuthProvider::sign_in
//! [`refresh_token`]: ChannelAuthProvider::refresh_token
//! [`expire`]: ChannelAuthProvider::expire

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use escolar_models::Subject;

use crate::events::AuthEvent;
use crate::provider::{AuthError, AuthProvider};

const EVENT_BUFFER: usize = 32;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps `current_subject()` calls pending until released or dropped.
#[derive(Debug)]
pub struct CurrentSubjectHold {
    release: watch::Sender<bool>,
}

impl CurrentSubjectHold {
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CurrentSubjectHold {
    fn drop(&mut self) {
        self.release.send_replace(true);
    }
}

#[derive(Debug)]
pub struct ChannelAuthProvider {
    current: Mutex<Option<Subject>>,
    events: broadcast::Sender<AuthEvent>,
    hold: Mutex<Option<watch::Receiver<bool>>>,
    current_subject_calls: AtomicUsize,
    sign_outs: AtomicUsize,
    fail_sign_out: AtomicBool,
}

impl Default for ChannelAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            current: Mutex::new(None),
            events,
            hold: Mutex::new(None),
            current_subject_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    /// Provider whose session already belongs to `subject`.
    pub fn with_subject(subject: Subject) -> Self {
        let provider = Self::new();
        *lock(&provider.current) = Some(subject);
        provider
    }

    pub fn sign_in(&self, subject: Subject) {
        *lock(&self.current) = Some(subject.clone());
        self.emit(AuthEvent::signed_in(subject));
    }

    /// Emits `TOKEN_REFRESHED` for the current subject; no-op when signed out.
    pub fn refresh_token(&self) {
        let current = lock(&self.current).clone();
        if let Some(subject) = current {
            self.emit(AuthEvent::token_refreshed(subject));
        }
    }

    /// The provider-side session ended on its own (expiry, revocation).
    pub fn expire(&self) {
        lock(&self.current).take();
        self.emit(AuthEvent::signed_out());
    }

    /// Sends a raw event without touching the current subject.
    pub fn emit(&self, event: AuthEvent) {
        debug!(%event, "Emitting auth event");
        // No subscribers is fine; the event is simply dropped.
        let _ = self.events.send(event);
    }

    pub fn hold_current_subject(&self) -> CurrentSubjectHold {
        let (release, rx) = watch::channel(false);
        *lock(&self.hold) = Some(rx);
        CurrentSubjectHold { release }
    }

    pub fn set_sign_out_failure(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub fn current_subject_calls(&self) -> usize {
        self.current_subject_calls.load(Ordering::SeqCst)
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.current).is_some()
    }
}

#[async_trait]
impl AuthProvider for ChannelAuthProvider {
    async fn current_subject(&self) -> Result<Option<Subject>, AuthError> {
        self.current_subject_calls.fetch_add(1, Ordering::SeqCst);

        let hold = lock(&self.hold).clone();
        if let Some(mut hold) = hold {
            // A dropped hold counts as released.
            while !*hold.borrow_and_update() {
                if hold.changed().await.is_err() {
                    break;
                }
            }
        }

        Ok(lock(&self.current).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("sign-out rejected".into()));
        }

        let previous = lock(&self.current).take();
        if let Some(subject) = previous {
            info!(subject.id = %subject.id, "Provider session signed out");
        }
        self.emit(AuthEvent::signed_out());
        Ok(())
    }
}
