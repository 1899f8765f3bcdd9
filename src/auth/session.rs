//! Session/Auth Manager
//!
//! Single source of truth for who is signed in. The manager is the only writer
//! of [`SessionState`]; readers take snapshots or subscribe to changes. Every
//! path out of an authenticated session (explicit logout, expired credential,
//! inactivity, a 401 from the API) goes through the same teardown: both
//! credential tiers are wiped, the bearer header is removed, the inactivity
//! timer is disarmed, and the user is sent to the login view.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::credential::Credential;
use super::inactivity::{ActivityEvent, ActivitySource, InactivityTimer};
use super::models::{
    Address, ChangePasswordRequest, LoginRequest, LoginResponse, ProfileEnvelope,
    RegisterRequest, RegisterResponse, UpdateProfileRequest, UserProfile,
};
use super::store::CredentialVault;
use crate::error::{ClientError, FieldErrors, GENERIC_FAILURE};
use crate::http::{ApiRequest, HttpPipeline};
use crate::navigation::{Navigator, HOME_PATH, LOGIN_PATH};
use crate::validation;

/// Where the session is in its sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    LoggedOut,
    Expired,
    Inactive,
    Unauthorized,
}

/// Snapshot of the session record.
///
/// `authenticated` holds exactly when a credential is held, and `admin`
/// exactly when the profile's role may administer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub credential: Option<Credential>,
    pub profile: Option<UserProfile>,
    pub authenticated: bool,
    pub admin: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// How the most recent session ended, if one has.
    pub ended: Option<SessionEnd>,
}

impl Default for SessionState {
    /// State before the stored credential has been looked at.
    fn default() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            credential: None,
            profile: None,
            authenticated: false,
            admin: false,
            loading: true,
            error: None,
            ended: None,
        }
    }
}

impl SessionState {
    /// Settled state with nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::default()
        }
    }

    /// Authenticated state for `profile`; the admin flag follows its role.
    pub fn signed_in(credential: Credential, profile: UserProfile) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            admin: profile.role.can_administer(),
            credential: Some(credential),
            profile: Some(profile),
            authenticated: true,
            loading: false,
            error: None,
            ended: None,
        }
    }
}

struct Inner {
    http: Arc<HttpPipeline>,
    vault: CredentialVault,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    timer: InactivityTimer,
}

/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

/// Non-owning handle, used by response handlers and timer callbacks so they
/// do not keep a torn-down session alive.
#[derive(Clone, Default)]
pub struct WeakSessionManager(Weak<Inner>);

impl WeakSessionManager {
    /// The live manager, or `None` once every owner has been dropped.
    pub fn upgrade(&self) -> Option<SessionManager> {
        self.0.upgrade().map(|inner| SessionManager { inner })
    }

    /// Handle that never upgrades.
    pub fn dangling() -> Self {
        Self(Weak::new())
    }
}

impl SessionManager {
    /// Builds a manager in the initial loading state. Nothing is read from
    /// storage until [`initialize`](Self::initialize) runs.
    ///
    /// `inactivity_timeout` is how long an authenticated session may go
    /// without [`record_activity`](Self::record_activity) before it is ended.
    pub fn new(
        http: Arc<HttpPipeline>,
        vault: CredentialVault,
        navigator: Arc<dyn Navigator>,
        inactivity_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                http,
                vault,
                navigator,
                state,
                timer: InactivityTimer::new(inactivity_timeout),
            }),
        }
    }

    /// Non-owning handle for callbacks that must not keep the session alive.
    pub fn downgrade(&self) -> WeakSessionManager {
        WeakSessionManager(Arc::downgrade(&self.inner))
    }

    /// Copy of the current session record.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state transition from now on.
    ///
    /// The receiver starts with the current state marked as seen, so the
    /// first `changed()` resolves on the next transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// True while a credential is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().authenticated
    }

    /// True while the held profile's role may administer.
    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().admin
    }

    /// Credential storage shared with the forced-logout handler.
    pub fn vault(&self) -> &CredentialVault {
        &self.inner.vault
    }

    /// Whether the inactivity timeout is currently counting down.
    pub fn inactivity_armed(&self) -> bool {
        self.inner.timer.is_armed()
    }

    /// Restores the session from storage. Run once at startup.
    pub async fn initialize(&self) -> SessionState {
        let stored = match self.inner.vault.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                None
            }
        };

        match stored {
            Some((credential, tier)) if !credential.is_expired() => {
                info!("Restoring session from {:?} storage", tier);
                self.inner.http.auth_header().install(&credential);
                match self.fetch_profile().await {
                    Ok(profile) => {
                        info!("Session restored for {}", profile.email);
                        self.inner
                            .state
                            .send_replace(SessionState::signed_in(credential, profile));
                        self.arm_inactivity();
                    }
                    Err(e) => {
                        warn!("Profile fetch failed during restore: {}", e);
                        self.clear_credentials();
                        self.inner.state.send_replace(SessionState::signed_out());
                    }
                }
            }
            stored => {
                if stored.is_some() {
                    info!("Stored credential has expired, discarding");
                } else {
                    debug!("No stored credential");
                }
                self.clear_credentials();
                self.inner.state.send_replace(SessionState::signed_out());
            }
        }

        self.snapshot()
    }

    /// Signs in and stores the credential in the durable tier when
    /// `remember` is set, otherwise in the session tier.
    ///
    /// On failure the visible error is set before the error is returned. A
    /// credential that is already expired when it arrives is not stored; the
    /// session ends as [`SessionEnd::Expired`] instead.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<(), ClientError> {
        let request = ApiRequest::post("/api/auth/login").json(&LoginRequest {
            email,
            password,
            remember_me: remember,
        })?;

        info!("Logging in {} (remember: {})", email, remember);
        self.clear_credentials();
        self.inner.state.send_replace(SessionState {
            phase: SessionPhase::Authenticating,
            loading: true,
            ..SessionState::signed_out()
        });

        let LoginResponse { token, user } = match self.inner.http.send_json(request).await {
            Ok(response) => response,
            Err(err) => {
                let message = login_failure_message(&err);
                warn!("Login failed for {}: {}", email, err);
                self.fail_with(message);
                return Err(err);
            }
        };

        if token.is_expired() {
            warn!("Login for {} returned an expired credential", email);
            self.end_session(SessionEnd::Expired);
            return Err(ClientError::Authentication("session expired".into()));
        }

        if let Err(err) = self.inner.vault.persist(&token, remember) {
            error!("Failed to store credential: {}", err);
            self.fail_with(err.user_message());
            return Err(err);
        }
        self.inner.http.auth_header().install(&token);

        info!("Logged in as {} ({})", user.email, user.role.as_str());
        self.inner.state.send_replace(SessionState::signed_in(token, user));
        self.arm_inactivity();
        self.inner.navigator.navigate(HOME_PATH);
        Ok(())
    }

    /// Creates an account and signs into it with `remember` set.
    ///
    /// Returns the raw credential: the one from the registration response
    /// when the API sends one, otherwise the one from the follow-up login.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Credential, ClientError> {
        self.register_with_address(name, email, password, None).await
    }

    /// [`register`](Self::register) with an optional postal address sent
    /// along with the account details.
    pub async fn register_with_address(
        &self,
        name: &str,
        email: &str,
        password: &str,
        address: Option<&Address>,
    ) -> Result<Credential, ClientError> {
        let request = ApiRequest::post("/api/auth/register").json(&RegisterRequest {
            name,
            email,
            password,
            address,
        })?;

        info!("Registering {}", email);
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let registered: RegisterResponse = match self.inner.http.send_lenient(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Registration failed for {}: {}", email, err);
                let message = match &err {
                    ClientError::Transport(_) => GENERIC_FAILURE.to_string(),
                    other => other.user_message(),
                };
                self.fail_with(message);
                return Err(err);
            }
        };
        if let Some(message) = &registered.message {
            debug!("Registration acknowledged: {}", message);
        }

        self.login(email, password, true).await?;

        registered
            .token
            .or_else(|| self.snapshot().credential)
            .ok_or_else(|| ClientError::Authentication("login did not yield a credential".into()))
    }

    /// Ends the session at the user's request.
    pub fn logout(&self) {
        self.end_session(SessionEnd::LoggedOut);
    }

    /// Ends the session after the API rejected the credential.
    pub fn force_logout(&self) {
        self.end_session(SessionEnd::Unauthorized);
    }

    /// Tears the session down if the held credential has expired.
    pub fn expire_if_stale(&self) -> bool {
        self.expire_if_stale_at(Utc::now())
    }

    /// [`expire_if_stale`](Self::expire_if_stale) against an explicit clock.
    pub fn expire_if_stale_at(&self, now: DateTime<Utc>) -> bool {
        let expired = self
            .inner
            .state
            .borrow()
            .credential
            .as_ref()
            .is_some_and(|c| c.is_expired_at(now));
        if expired {
            self.end_session(SessionEnd::Expired);
        }
        expired
    }

    /// Dismisses the visible error, if any.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Counts as user input for the inactivity timeout.
    pub fn record_activity(&self, event: ActivityEvent) {
        if !self.is_authenticated() {
            return;
        }
        debug!("Activity: {:?}", event);
        if self.inner.timer.is_armed() {
            self.inner.timer.reset();
        } else {
            self.arm_inactivity();
        }
    }

    /// Feeds events from `source` into [`record_activity`](Self::record_activity)
    /// until the source closes or the session is dropped.
    pub fn watch_activity<S: ActivitySource>(&self, mut source: S) -> JoinHandle<()> {
        let session = self.downgrade();
        tokio::spawn(async move {
            while let Some(event) = source.next_event().await {
                match session.upgrade() {
                    Some(session) => session.record_activity(event),
                    None => break,
                }
            }
            debug!("Activity source closed");
        })
    }

    /// Updates name and address and refreshes the held profile.
    pub async fn update_profile(&self, name: &str, address: &Address) -> Result<UserProfile, ClientError> {
        self.require_authenticated()?;
        let request = ApiRequest::put("/api/profile").json(&UpdateProfileRequest { name, address })?;

        let response: ProfileUpdate = self.inner.http.send_lenient(request).await?;
        let profile = match response.user {
            Some(profile) => profile,
            None => self.fetch_profile().await?,
        };

        self.inner.state.send_modify(|s| {
            if s.authenticated {
                s.admin = profile.role.can_administer();
                s.profile = Some(profile.clone());
            }
        });
        info!("Profile updated for {}", profile.email);
        Ok(profile)
    }

    /// Changes the password after checking the new one locally.
    ///
    /// A server complaint about the current password comes back as a
    /// field error on `current_password`.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ClientError> {
        self.require_authenticated()?;
        validation::validate_new_password(new)?;

        let request = ApiRequest::post("/api/auth/change-password").json(&ChangePasswordRequest {
            current_password: current,
            new_password: new,
        })?;

        match self.inner.http.send_ack(request).await {
            Ok(_) => {
                info!("Password changed");
                Ok(())
            }
            Err(err) if err.user_message().to_lowercase().contains("current password") => {
                let mut fields = FieldErrors::new();
                fields.add("current_password", "Current password is incorrect");
                Err(ClientError::Validation(fields))
            }
            Err(err) => Err(err),
        }
    }

    /// Reacts to a 403 from the API.
    ///
    /// The admin flag is dropped at once and the user is sent home. When the
    /// flag had been set, the profile is fetched again in the background so
    /// the role reflects what the server now says. Ignored while signed out,
    /// which covers the 403 a banned account gets from login.
    pub fn handle_forbidden(&self) {
        if !self.is_authenticated() {
            return;
        }
        let was_admin = self
            .inner
            .state
            .send_if_modified(|s| std::mem::replace(&mut s.admin, false));
        warn!("Request forbidden, returning to {}", HOME_PATH);
        self.inner.navigator.navigate(HOME_PATH);

        if was_admin {
            let session = self.clone();
            tokio::spawn(async move {
                if let Err(e) = session.refresh_profile().await {
                    warn!("Profile refresh after 403 failed: {}", e);
                }
            });
        }
    }

    /// Fetches the profile again and replaces the held one, recomputing the
    /// admin flag from its role.
    pub async fn refresh_profile(&self) -> Result<UserProfile, ClientError> {
        self.require_authenticated()?;
        let profile = self.fetch_profile().await?;
        self.inner.state.send_modify(|s| {
            if s.authenticated {
                s.admin = profile.role.can_administer();
                s.profile = Some(profile.clone());
            }
        });
        debug!("Profile refreshed for {} ({})", profile.email, profile.role.as_str());
        Ok(profile)
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ClientError> {
        let envelope: ProfileEnvelope = self
            .inner
            .http
            .send_json(ApiRequest::get("/api/profile").retryable())
            .await?;
        Ok(envelope.into_profile())
    }

    fn require_authenticated(&self) -> Result<(), ClientError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::Authentication("not signed in".into()))
        }
    }

    fn arm_inactivity(&self) {
        let session = self.downgrade();
        let timeout = self.inner.timer.timeout();
        self.inner.timer.arm(move || {
            if let Some(session) = session.upgrade() {
                warn!("No activity for {:?}, logging out", timeout);
                session.end_session(SessionEnd::Inactive);
            }
        });
    }

    fn fail_with(&self, message: String) {
        self.inner.state.send_replace(SessionState {
            error: Some(message),
            ..SessionState::signed_out()
        });
    }

    fn clear_credentials(&self) {
        self.inner.timer.disarm();
        if let Err(e) = self.inner.vault.wipe() {
            error!("Failed to wipe credential storage: {}", e);
        }
        self.inner.http.auth_header().remove();
    }

    /// The one teardown path.
    fn end_session(&self, reason: SessionEnd) {
        info!("Ending session: {:?}", reason);
        self.clear_credentials();
        self.inner.state.send_replace(SessionState {
            ended: Some(reason),
            ..SessionState::signed_out()
        });
        self.inner.navigator.navigate(LOGIN_PATH);
        self.inner.navigator.reload();
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct ProfileUpdate {
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Banner text for a failed login.
fn login_failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Authentication(_) => "Invalid email or password".to_string(),
        ClientError::NotFound(_) => "Email address not found".to_string(),
        ClientError::Banned { message, .. } => message.clone(),
        ClientError::Transport(_) | ClientError::Decode(_) => GENERIC_FAILURE.to_string(),
        other => other.user_message(),
    }
}
