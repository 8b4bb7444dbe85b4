//! Authentication service
//!
//! Drives the house PIN → member PIN → session flow against a [`Store`], and
//! owns the session lifecycle: refresh rotation, logout, revocation on PIN
//! changes. Time and randomness come in as effects so tests can control both.
//!
//! PIN hashing runs outside any store lock. Every write then goes through a
//! `modify_*` closure that re-checks what the hash was verified against, so a
//! deactivation, role change or PIN reset landing mid-login is never undone.

use crate::config::AuthConfig;
use crate::pin::{validate_personal_pin, validate_pin, PinHasher};
use crate::throttle::Throttle;
use crate::token::{token_digest, TokenClaims, TokenCodec, TokenKind};
use crate::types::{
    HouseLogin, HouseSummary, LoginOutcome, MemberSummary, SessionTokens, TemporaryPin,
};
use crate::AuthenticationError;
use ha_authorization::{can_authenticate, can_manage, require_permission, ScopeFilter};
use ha_core::{
    Action, HaError, HouseId, Module, PhysicalTimeEffects, Principal, RandomEffects, Result,
    SessionId, Timestamp, UserId,
};
use ha_store::{
    house_change, session_change, user_change, Credential, HouseRepository, PinHash, RevokeReason,
    SessionRecord, SessionRepository, Store, UsedTokenRepository, UserRecord, UserRepository,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const PEPPER_CONTEXT: &[u8] = b"homeasisstan/pin-pepper/v1";

/// Identifies one issued PIN; a reset produces a new fingerprint
fn credential_fingerprint(pin_hash: &PinHash) -> String {
    token_digest(&format!("{}:{}", pin_hash.salt, pin_hash.digest))
}

/// Active and allowed to hold a session
fn ensure_login_allowed(user: &UserRecord) -> std::result::Result<(), AuthenticationError> {
    if !user.active {
        return Err(AuthenticationError::AccountInactive);
    }
    if !can_authenticate(user.role) {
        return Err(AuthenticationError::CannotAuthenticate(user.role));
    }
    Ok(())
}

/// Still holds the credential a PIN was verified against
fn ensure_credential(
    user: &UserRecord,
    verified: &Credential,
) -> std::result::Result<(), AuthenticationError> {
    if user.credential == *verified {
        Ok(())
    } else {
        Err(AuthenticationError::CredentialChanged)
    }
}

/// Permission checks for issuing `target` a temporary PIN
fn ensure_can_reset(actor: &Principal, target: &UserRecord) -> Result<()> {
    if target.house_id != actor.house_id {
        return Err(HaError::not_found(format!("member {}", target.id)));
    }
    if !can_manage(actor.role, target.role) {
        return Err(HaError::permission_denied(format!(
            "role {} may not manage a {}",
            actor.role, target.role
        )));
    }
    if !can_authenticate(target.role) {
        return Err(HaError::invalid(format!(
            "role {} cannot hold a PIN",
            target.role
        )));
    }
    if !target.active {
        return Err(HaError::conflict(format!("member {} is deactivated", target.id)));
    }
    Ok(())
}

/// Authentication flows and session lifecycle
pub struct AuthService {
    store: Arc<dyn Store>,
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomEffects>,
    config: AuthConfig,
    codec: TokenCodec,
    hasher: PinHasher,
    throttle: Throttle,
    /// Serializes refresh so a token can only be rotated once
    rotation: Mutex<()>,
}

impl AuthService {
    /// Build the service; fails when `config` does not validate
    pub fn new(
        store: Arc<dyn Store>,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomEffects>,
        config: AuthConfig,
    ) -> Result<Self> {
        config.validate()?;
        let codec = TokenCodec::new(config.token_secret.as_bytes())?;
        let mut pepper = Sha256::new();
        pepper.update(PEPPER_CONTEXT);
        pepper.update(config.token_secret.as_bytes());
        let hasher = PinHasher::new(pepper.finalize().to_vec(), config.pin_hash_iterations);
        let throttle = config.throttle();
        Ok(Self {
            store,
            time,
            random,
            config,
            codec,
            hasher,
            throttle,
            rotation: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Current time from the time effect
    pub async fn now(&self) -> Timestamp {
        self.time.now().await
    }

    async fn new_jti(&self) -> String {
        hex::encode(self.random.random_bytes(16).await)
    }

    /// Hash a PIN under a fresh random salt
    pub async fn hash_pin(&self, pin: &str) -> Result<PinHash> {
        let salt = self.random.random_bytes_32().await;
        Ok(self.hasher.hash(pin, &salt)?)
    }

    /// Generate a temporary PIN for `user_id` and the credential that stores it
    pub async fn temporary_credential(
        &self,
        user_id: UserId,
    ) -> Result<(TemporaryPin, Credential)> {
        let pin = self
            .random
            .random_digits(self.config.temporary_pin_length)
            .await;
        let expires_at = self.now().await.plus(self.config.temporary_pin_ttl());
        let pin_hash = self.hash_pin(&pin).await?;
        Ok((
            TemporaryPin {
                user_id,
                pin,
                expires_at,
            },
            Credential::Temporary {
                pin_hash,
                expires_at,
            },
        ))
    }

    // ------------------------------------------------------------------
    // Step 1: house PIN
    // ------------------------------------------------------------------

    /// Verify the shared house PIN and list the members that can log in
    pub async fn verify_house_pin(&self, house_code: &str, pin: &str) -> Result<HouseLogin> {
        let now = self.now().await;
        let mut house = self
            .store
            .find_house_by_code(house_code.trim())
            .await?
            .ok_or(AuthenticationError::InvalidHouseCredentials)?;
        self.throttle.check(&house, now)?;

        let throttle = self.throttle;
        let valid = validate_pin(pin).is_ok() && self.hasher.verify(pin, &house.pin_hash)?;
        if !valid {
            let mut locked = false;
            self.store
                .modify_house(
                    house.id,
                    house_change(|h| {
                        locked = throttle.record_failure(h, now);
                        Ok(())
                    }),
                )
                .await?;
            warn!(house_id = %house.id, locked, "House PIN rejected");
            return Err(self.failure(locked, AuthenticationError::InvalidHouseCredentials));
        }
        if house.failed_attempts != 0 || house.locked_until.is_some() {
            house = self
                .store
                .modify_house(
                    house.id,
                    house_change(|h| {
                        throttle.record_success(h);
                        Ok(())
                    }),
                )
                .await?;
        }

        let expires_at = now.plus(self.config.house_token_ttl());
        let house_token = self.codec.encode(&TokenClaims {
            kind: TokenKind::House,
            sub: None,
            hid: house.id,
            sid: None,
            role: None,
            iat: now,
            exp: expires_at,
            jti: self.new_jti().await,
            cred: None,
        })?;
        let members = self.selectable_members(house.id).await?;
        info!(house_id = %house.id, members = members.len(), "House PIN verified");

        Ok(HouseLogin {
            house_token,
            expires_at,
            house: HouseSummary::from(&house),
            members,
        })
    }

    /// Member list for a still-valid house token
    pub async fn members_for_house_token(&self, house_token: &str) -> Result<Vec<MemberSummary>> {
        let claims = self
            .codec
            .decode(house_token, TokenKind::House, self.now().await)?;
        self.selectable_members(claims.hid).await
    }

    async fn selectable_members(&self, house_id: HouseId) -> Result<Vec<MemberSummary>> {
        Ok(self
            .store
            .list_users(house_id)
            .await?
            .iter()
            .filter(|u| u.active && can_authenticate(u.role))
            .map(MemberSummary::from)
            .collect())
    }

    // ------------------------------------------------------------------
    // Step 2: member PIN
    // ------------------------------------------------------------------

    /// Log a selected member in with their PIN
    ///
    /// A temporary PIN yields an activation token instead of a session.
    pub async fn login(
        &self,
        house_token: &str,
        user_id: UserId,
        pin: &str,
        user_agent: Option<String>,
    ) -> Result<LoginOutcome> {
        let now = self.now().await;
        let claims = self.codec.decode(house_token, TokenKind::House, now)?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.house_id == claims.hid)
            .ok_or(AuthenticationError::InvalidPin)?;
        ensure_login_allowed(&user)?;
        self.throttle.check(&user, now)?;

        let (pin_hash, temporary) = match &user.credential {
            Credential::None => return Err(AuthenticationError::NoCredential.into()),
            Credential::Temporary {
                pin_hash,
                expires_at,
            } => {
                if now >= *expires_at {
                    return Err(AuthenticationError::TemporaryPinExpired.into());
                }
                (pin_hash.clone(), true)
            }
            Credential::Personal { pin_hash } => (pin_hash.clone(), false),
        };

        let throttle = self.throttle;
        if !self.hasher.verify(pin, &pin_hash)? {
            let mut locked = false;
            self.store
                .modify_user(
                    user_id,
                    user_change(|u, _| {
                        locked = throttle.record_failure(u, now);
                        Ok(())
                    }),
                )
                .await?;
            warn!(user_id = %user_id, locked, "Member PIN rejected");
            return Err(self.failure(locked, AuthenticationError::InvalidPin));
        }

        let verified = user.credential;
        if temporary {
            self.store
                .modify_user(
                    user_id,
                    user_change(|u, _| {
                        ensure_login_allowed(u)?;
                        ensure_credential(u, &verified)?;
                        throttle.record_success(u);
                        Ok(())
                    }),
                )
                .await?;
            let expires_at = now.plus(self.config.activation_token_ttl());
            let activation_token = self.codec.encode(&TokenClaims {
                kind: TokenKind::Activation,
                sub: Some(user_id),
                hid: claims.hid,
                sid: None,
                role: None,
                iat: now,
                exp: expires_at,
                jti: self.new_jti().await,
                cred: Some(credential_fingerprint(&pin_hash)),
            })?;
            info!(user_id = %user_id, "Temporary PIN accepted, activation required");
            return Ok(LoginOutcome::ActivationRequired {
                activation_token,
                expires_at,
            });
        }

        let user = self
            .store
            .modify_user(
                user_id,
                user_change(|u, _| {
                    ensure_login_allowed(u)?;
                    ensure_credential(u, &verified)?;
                    u.last_login_at = Some(now);
                    throttle.record_success(u);
                    Ok(())
                }),
            )
            .await?;
        let tokens = self.open_session(user, now, user_agent).await?;
        Ok(LoginOutcome::Session(tokens))
    }

    // ------------------------------------------------------------------
    // Step 3: activation
    // ------------------------------------------------------------------

    /// Replace a temporary PIN with a personal one and open a session
    ///
    /// Each activation token works once, and only while the member still holds
    /// the temporary PIN it was issued for.
    pub async fn activate(
        &self,
        activation_token: &str,
        new_pin: &str,
        user_agent: Option<String>,
    ) -> Result<SessionTokens> {
        let now = self.now().await;
        let claims = self
            .codec
            .decode(activation_token, TokenKind::Activation, now)?;
        validate_personal_pin(new_pin)?;

        let user_id = claims.subject()?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.house_id == claims.hid)
            .ok_or(AuthenticationError::AccountInactive)?;
        ensure_login_allowed(&user)?;
        let issued_for = match &user.credential {
            Credential::Temporary { pin_hash, .. } => credential_fingerprint(pin_hash),
            Credential::Personal { .. } => {
                return Err(AuthenticationError::AlreadyActivated.into())
            }
            Credential::None => return Err(AuthenticationError::NoCredential.into()),
        };
        if claims.cred.as_deref() != Some(issued_for.as_str()) {
            warn!(user_id = %user_id, "Activation token issued for a replaced PIN");
            return Err(AuthenticationError::CredentialChanged.into());
        }

        self.store.purge_used_tokens(now).await?;
        if !self.store.consume_token(&claims.jti, claims.exp).await? {
            warn!(user_id = %user_id, "Activation token replayed");
            return Err(AuthenticationError::ActivationTokenUsed.into());
        }

        let verified = user.credential;
        let personal = Credential::Personal {
            pin_hash: self.hash_pin(new_pin).await?,
        };
        let throttle = self.throttle;
        let user = self
            .store
            .modify_user(
                user_id,
                user_change(|u, _| {
                    ensure_login_allowed(u)?;
                    ensure_credential(u, &verified)?;
                    u.credential = personal;
                    u.last_login_at = Some(now);
                    throttle.record_success(u);
                    Ok(())
                }),
            )
            .await?;
        info!(user_id = %user_id, "Member activated");
        self.open_session(user, now, user_agent).await
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Open a session for a member whose login was just committed
    ///
    /// The member is read again after the session is stored. A deactivation,
    /// demotion to pet or PIN reset that slipped in between revokes the new
    /// session; one that lands later finds it in the session list.
    async fn open_session(
        &self,
        user: UserRecord,
        now: Timestamp,
        user_agent: Option<String>,
    ) -> Result<SessionTokens> {
        let session_id = SessionId::new();
        let refresh_expires_at = now.plus(self.config.refresh_token_ttl());
        let (access_token, access_expires_at) = self.access_token(&user, session_id, now).await?;
        let refresh_token = self
            .refresh_token(&user, session_id, now, refresh_expires_at)
            .await?;

        self.store
            .insert_session(SessionRecord {
                id: session_id,
                house_id: user.house_id,
                user_id: user.id,
                created_at: now,
                last_used_at: now,
                expires_at: refresh_expires_at,
                refresh_digest: token_digest(&refresh_token),
                generation: 0,
                is_revoked: false,
                revoked_at: None,
                revoke_reason: None,
                user_agent,
            })
            .await?;

        let still_valid = match self.store.get_user(user.id).await? {
            Some(current) => ensure_login_allowed(&current)
                .and_then(|()| ensure_credential(&current, &user.credential)),
            None => Err(AuthenticationError::AccountInactive),
        };
        if let Err(err) = still_valid {
            self.revoke_session(session_id, RevokeReason::Revoked, now)
                .await?;
            warn!(user_id = %user.id, session_id = %session_id, "Member changed during login");
            return Err(err.into());
        }
        info!(user_id = %user.id, session_id = %session_id, role = %user.role, "Session opened");

        Ok(SessionTokens {
            session_id,
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            user: MemberSummary::from(&user),
        })
    }

    async fn access_token(
        &self,
        user: &UserRecord,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<(String, Timestamp)> {
        let exp = now.plus(self.config.access_token_ttl());
        let token = self.codec.encode(&TokenClaims {
            kind: TokenKind::Access,
            sub: Some(user.id),
            hid: user.house_id,
            sid: Some(session_id),
            role: Some(user.role),
            iat: now,
            exp,
            jti: self.new_jti().await,
            cred: None,
        })?;
        Ok((token, exp))
    }

    async fn refresh_token(
        &self,
        user: &UserRecord,
        session_id: SessionId,
        now: Timestamp,
        exp: Timestamp,
    ) -> Result<String> {
        Ok(self.codec.encode(&TokenClaims {
            kind: TokenKind::Refresh,
            sub: Some(user.id),
            hid: user.house_id,
            sid: Some(session_id),
            role: None,
            iat: now,
            exp,
            jti: self.new_jti().await,
            cred: None,
        })?)
    }

    /// Exchange a refresh token for a new access/refresh pair
    ///
    /// The presented token is superseded. Presenting a superseded token
    /// revokes the whole session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens> {
        let _rotation = self.rotation.lock().await;
        let now = self.now().await;
        let claims = self.codec.decode(refresh_token, TokenKind::Refresh, now)?;
        let session_id = claims.session()?;
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(AuthenticationError::SessionRevoked)?;
        if session.is_revoked {
            return Err(AuthenticationError::SessionRevoked.into());
        }
        if !session.is_active(now) {
            self.revoke_session(session_id, RevokeReason::Expired, now)
                .await?;
            return Err(AuthenticationError::SessionExpired.into());
        }

        let presented = token_digest(refresh_token);
        if !bool::from(presented.as_bytes().ct_eq(session.refresh_digest.as_bytes())) {
            self.revoke_session(session_id, RevokeReason::RefreshReuse, now)
                .await?;
            warn!(session_id = %session_id, "Superseded refresh token presented, session revoked");
            return Err(AuthenticationError::RefreshTokenReuse.into());
        }

        let user = self
            .store
            .get_user(session.user_id)
            .await?
            .filter(|u| ensure_login_allowed(u).is_ok());
        let Some(user) = user else {
            self.revoke_session(session_id, RevokeReason::MemberDeactivated, now)
                .await?;
            return Err(AuthenticationError::AccountInactive.into());
        };

        let refresh_expires_at = now.plus(self.config.refresh_token_ttl());
        let (access_token, access_expires_at) = self.access_token(&user, session_id, now).await?;
        let refresh_token = self
            .refresh_token(&user, session_id, now, refresh_expires_at)
            .await?;
        let digest = token_digest(&refresh_token);
        let session = self
            .store
            .modify_session(
                session_id,
                session_change(|s| {
                    if s.is_revoked {
                        return Err(AuthenticationError::SessionRevoked.into());
                    }
                    s.refresh_digest = digest;
                    s.generation += 1;
                    s.last_used_at = now;
                    s.expires_at = refresh_expires_at;
                    Ok(())
                }),
            )
            .await?;
        debug!(session_id = %session_id, generation = session.generation, "Session refreshed");

        Ok(SessionTokens {
            session_id,
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            user: MemberSummary::from(&user),
        })
    }

    /// Resolve an access token to the member it speaks for
    ///
    /// The role is read from the member record, so a role change applies
    /// without waiting for the token to expire.
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal> {
        let now = self.now().await;
        let claims = self.codec.decode(access_token, TokenKind::Access, now)?;
        let session_id = claims.session()?;
        let user_id = claims.subject()?;
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(AuthenticationError::SessionRevoked)?;
        if session.is_revoked {
            return Err(AuthenticationError::SessionRevoked.into());
        }
        if !session.is_active(now) {
            return Err(AuthenticationError::SessionExpired.into());
        }
        if session.user_id != user_id {
            return Err(HaError::unauthorized("token does not match its session"));
        }
        let user = self
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.active)
            .ok_or(AuthenticationError::AccountInactive)?;
        Ok(Principal::new(user.id, user.house_id, user.role, session.id))
    }

    /// End the session behind an access token
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let principal = self.authenticate(access_token).await?;
        let now = self.now().await;
        self.revoke_session(principal.session_id, RevokeReason::Logout, now)
            .await?;
        info!(user_id = %principal.user_id, session_id = %principal.session_id, "Logged out");
        Ok(())
    }

    /// Soft-delete one session; `false` when it was already revoked
    pub async fn revoke_session(
        &self,
        session_id: SessionId,
        reason: RevokeReason,
        now: Timestamp,
    ) -> Result<bool> {
        let mut revoked = false;
        self.store
            .modify_session(
                session_id,
                session_change(|s| {
                    revoked = s.revoke(reason, now);
                    Ok(())
                }),
            )
            .await?;
        Ok(revoked)
    }

    /// Revoke every active session of one member, optionally sparing one
    ///
    /// Returns the ids of the sessions that were revoked.
    pub async fn revoke_user_sessions(
        &self,
        house_id: HouseId,
        user_id: UserId,
        reason: RevokeReason,
        except: Option<SessionId>,
    ) -> Result<Vec<SessionId>> {
        let now = self.now().await;
        let filter = ScopeFilter {
            house_id,
            owner: Some(user_id),
        };
        let mut revoked = Vec::new();
        for session in self.store.list_sessions(&filter).await? {
            if Some(session.id) == except || !session.is_active(now) {
                continue;
            }
            if self.revoke_session(session.id, reason, now).await? {
                revoked.push(session.id);
            }
        }
        if !revoked.is_empty() {
            info!(user_id = %user_id, count = revoked.len(), ?reason, "Member sessions revoked");
        }
        Ok(revoked)
    }

    // ------------------------------------------------------------------
    // PIN management
    // ------------------------------------------------------------------

    /// Issue a new temporary PIN to a member the actor manages
    ///
    /// The member's sessions are revoked; their next login goes through
    /// activation.
    pub async fn issue_temporary_pin(
        &self,
        actor: &Principal,
        user_id: UserId,
    ) -> Result<TemporaryPin> {
        require_permission(actor.role, Module::Users, Action::Edit)?;
        let target = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| HaError::not_found(format!("member {user_id}")))?;
        actor.ensure_house(target.house_id)?;
        ensure_can_reset(actor, &target)?;

        let (issued, credential) = self.temporary_credential(user_id).await?;
        let throttle = self.throttle;
        self.store
            .modify_user(
                user_id,
                user_change(|u, _| {
                    ensure_can_reset(actor, u)?;
                    u.credential = credential;
                    throttle.record_success(u);
                    Ok(())
                }),
            )
            .await?;
        self.revoke_user_sessions(actor.house_id, user_id, RevokeReason::PinChanged, None)
            .await?;
        info!(actor = %actor.user_id, user_id = %user_id, "Temporary PIN issued");
        Ok(issued)
    }

    /// Change the caller's own personal PIN
    ///
    /// Other sessions of the member are revoked; the calling session stays.
    pub async fn change_pin(
        &self,
        principal: &Principal,
        current: &str,
        new_pin: &str,
    ) -> Result<()> {
        validate_personal_pin(new_pin)?;
        if current == new_pin {
            return Err(
                AuthenticationError::WeakPin("new PIN must differ from the current one".into())
                    .into(),
            );
        }
        let now = self.now().await;
        let user = self
            .store
            .get_user(principal.user_id)
            .await?
            .filter(|u| u.active)
            .ok_or(AuthenticationError::AccountInactive)?;
        self.throttle.check(&user, now)?;

        let pin_hash = match &user.credential {
            Credential::Personal { pin_hash } => pin_hash.clone(),
            _ => return Err(AuthenticationError::NoCredential.into()),
        };
        let throttle = self.throttle;
        if !self.hasher.verify(current, &pin_hash)? {
            let mut locked = false;
            self.store
                .modify_user(
                    principal.user_id,
                    user_change(|u, _| {
                        locked = throttle.record_failure(u, now);
                        Ok(())
                    }),
                )
                .await?;
            return Err(self.failure(locked, AuthenticationError::InvalidPin));
        }

        let verified = user.credential;
        let personal = Credential::Personal {
            pin_hash: self.hash_pin(new_pin).await?,
        };
        self.store
            .modify_user(
                principal.user_id,
                user_change(|u, _| {
                    if !u.active {
                        return Err(AuthenticationError::AccountInactive.into());
                    }
                    ensure_credential(u, &verified)?;
                    u.credential = personal;
                    throttle.record_success(u);
                    Ok(())
                }),
            )
            .await?;
        self.revoke_user_sessions(
            principal.house_id,
            principal.user_id,
            RevokeReason::PinChanged,
            Some(principal.session_id),
        )
        .await?;
        info!(user_id = %principal.user_id, "PIN changed");
        Ok(())
    }

    /// Error for a rejected PIN; the lock error once the limit is hit
    fn failure(&self, locked: bool, err: AuthenticationError) -> HaError {
        if locked {
            AuthenticationError::Locked {
                retry_after_secs: self.throttle.lockout.as_secs(),
            }
            .into()
        } else {
            err.into()
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
