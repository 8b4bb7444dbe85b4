//! House fixtures
//!
//! [`TestHouse`] wires a [`MemoryStore`], a controllable clock, seeded
//! randomness and an [`AuthService`] together, then seeds one house with one
//! member per role. Every member except the pet holds a personal PIN from
//! [`TestHouse::pin_for`].

use crate::{ControllableTime, RecordingNotifier, SeededRandom};
use ha_authentication::{AuthConfig, AuthService, LoginOutcome, SessionTokens};
use ha_core::{HouseId, Principal, Role, Timestamp, UserId};
use ha_store::{
    Credential, HouseRecord, HouseRepository, MemoryStore, Store, UserRecord, UserRepository,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared PIN of the fixture house
pub const TEST_HOUSE_PIN: &str = "4826";

const TEST_SECRET: &str = "homeasisstan-test-secret-0123456789abcdef";

/// Auth settings for tests: fixed secret, cheap hashing
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: TEST_SECRET.into(),
        pin_hash_iterations: 2,
        ..AuthConfig::default()
    }
}

/// Install a test-writer subscriber once; honours `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn display_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "Alex",
        Role::Responsible => "Robin",
        Role::Member => "Morgan",
        Role::Simplified => "Sam",
        Role::External => "Eli",
        Role::Pet => "Biscuit",
    }
}

/// Builder for [`TestHouse`]
#[derive(Debug, Clone)]
pub struct TestHouseBuilder {
    seed: u64,
    name: String,
    code: String,
    start: Timestamp,
    config: AuthConfig,
    roles: Vec<Role>,
}

impl Default for TestHouseBuilder {
    fn default() -> Self {
        Self {
            seed: 42,
            name: "Test House".into(),
            code: "test-house".into(),
            start: ControllableTime::at_fixed_epoch().current(),
            config: test_auth_config(),
            roles: Role::ALL.to_vec(),
        }
    }
}

impl TestHouseBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn start_at(mut self, start: Timestamp) -> Self {
        self.start = start;
        self
    }

    pub fn config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed only these roles instead of all six
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub async fn build(self) -> TestHouse {
        let store = Arc::new(MemoryStore::new());
        let time = ControllableTime::new(self.start);
        let random = SeededRandom::new(self.seed);
        let auth = Arc::new(
            AuthService::new(
                store.clone(),
                Arc::new(time.clone()),
                Arc::new(random.clone()),
                self.config,
            )
            .expect("test auth config is valid"),
        );

        let house = HouseRecord {
            id: HouseId::new(),
            name: self.name,
            code: self.code,
            pin_hash: auth.hash_pin(TEST_HOUSE_PIN).await.unwrap(),
            created_at: self.start,
            failed_attempts: 0,
            locked_until: None,
        };
        store.insert_house(house.clone()).await.unwrap();

        let mut fixture = TestHouse {
            store,
            time,
            random,
            notifier: RecordingNotifier::new(),
            auth,
            house,
            members: BTreeMap::new(),
        };
        for role in self.roles {
            let credential = match TestHouse::pin_for(role) {
                Some(pin) => Credential::Personal {
                    pin_hash: fixture.auth.hash_pin(pin).await.unwrap(),
                },
                None => Credential::None,
            };
            let user = fixture
                .add_member(display_name(role), role, credential)
                .await;
            fixture.members.insert(role, user);
        }
        fixture
    }
}

/// One seeded house and the services around it
pub struct TestHouse {
    pub store: Arc<MemoryStore>,
    pub time: ControllableTime,
    pub random: SeededRandom,
    pub notifier: RecordingNotifier,
    pub auth: Arc<AuthService>,
    pub house: HouseRecord,
    members: BTreeMap<Role, UserRecord>,
}

impl TestHouse {
    pub fn builder() -> TestHouseBuilder {
        TestHouseBuilder::default()
    }

    pub fn house_id(&self) -> HouseId {
        self.house.id
    }

    pub fn store_dyn(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// Personal PIN of the seeded member with `role`; pets have none
    pub fn pin_for(role: Role) -> Option<&'static str> {
        match role {
            Role::Admin => Some("2468"),
            Role::Responsible => Some("1357"),
            Role::Member => Some("8642"),
            Role::Simplified => Some("9753"),
            Role::External => Some("1470"),
            Role::Pet => None,
        }
    }

    /// The seeded member with `role`, as it was at build time
    pub fn member(&self, role: Role) -> &UserRecord {
        self.members
            .get(&role)
            .unwrap_or_else(|| panic!("no {role} seeded in this house"))
    }

    pub fn member_id(&self, role: Role) -> UserId {
        self.member(role).id
    }

    /// Insert another member directly into the store
    pub async fn add_member(&self, name: &str, role: Role, credential: Credential) -> UserRecord {
        self.insert_member(UserId::new(), name, role, credential)
            .await
    }

    async fn insert_member(
        &self,
        id: UserId,
        name: &str,
        role: Role,
        credential: Credential,
    ) -> UserRecord {
        let user = UserRecord {
            id,
            house_id: self.house.id,
            display_name: name.into(),
            role,
            credential,
            active: true,
            created_at: self.time.current(),
            last_login_at: None,
            failed_attempts: 0,
            locked_until: None,
        };
        self.store.insert_user(user.clone()).await.unwrap();
        user
    }

    /// Insert a member holding a fresh temporary PIN; returns the PIN too
    pub async fn add_pending_member(&self, name: &str, role: Role) -> (UserRecord, String) {
        let id = UserId::new();
        let (issued, credential) = self.auth.temporary_credential(id).await.unwrap();
        let user = self.insert_member(id, name, role, credential).await;
        (user, issued.pin)
    }

    /// A fresh house token
    pub async fn house_token(&self) -> String {
        self.auth
            .verify_house_pin(&self.house.code, TEST_HOUSE_PIN)
            .await
            .unwrap()
            .house_token
    }

    /// Full login of the seeded member with `role`
    pub async fn login_as(&self, role: Role) -> SessionTokens {
        let pin = Self::pin_for(role).unwrap_or_else(|| panic!("{role} cannot log in"));
        let house_token = self.house_token().await;
        match self
            .auth
            .login(&house_token, self.member_id(role), pin, Some("testkit".into()))
            .await
            .unwrap()
        {
            LoginOutcome::Session(tokens) => tokens,
            other => panic!("expected a session for {role}, got {other:?}"),
        }
    }

    /// Log in and authenticate the resulting access token
    pub async fn principal(&self, role: Role) -> Principal {
        let tokens = self.login_as(role).await;
        self.auth.authenticate(&tokens.access_token).await.unwrap()
    }
}

impl std::fmt::Debug for TestHouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHouse")
            .field("house", &self.house.code)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}
