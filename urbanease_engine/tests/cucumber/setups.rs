use cucumber::given;
use log::*;

use crate::{cucumber::OrderWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut OrderWorld) {
    let system = TestSystem::new().await;
    debug!("Created database: {}", system.url);
    world.system = Some(system);
}
