//! Shared handler state

use ha_admin::{AdminServices, ServiceContext};
use ha_authentication::{AuthConfig, AuthService};
use ha_core::{PhysicalTimeEffects, RandomEffects, Result};
use ha_guards::RouteTable;
use ha_realtime::NotificationHub;
use ha_store::Store;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub admin: Arc<AdminServices>,
    pub hub: Arc<NotificationHub>,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    /// Wire the services over one store; the hub receives every notification
    pub fn new(
        store: Arc<dyn Store>,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomEffects>,
        config: AuthConfig,
    ) -> Result<Self> {
        let hub = Arc::new(NotificationHub::default());
        let auth = Arc::new(AuthService::new(store.clone(), time.clone(), random, config)?);
        let context = ServiceContext::new(store, time, hub.clone());
        Ok(Self {
            admin: Arc::new(AdminServices::new(context, auth.clone())),
            auth,
            hub,
            routes: Arc::new(RouteTable::standard()),
        })
    }
}
