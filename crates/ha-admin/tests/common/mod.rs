use ha_admin::{AdminServices, ServiceContext};
use ha_testkit::TestHouse;
use std::sync::Arc;

pub fn services(house: &TestHouse) -> AdminServices {
    let ctx = ServiceContext::new(
        house.store_dyn(),
        Arc::new(house.time.clone()),
        Arc::new(house.notifier.clone()),
    );
    AdminServices::new(ctx, house.auth.clone())
}
