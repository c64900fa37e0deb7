//! Given steps for message board BDD scenarios.

use super::world::{BoardWorld, run_async};
use eyre::WrapErr;
use message_board::board::domain::{IdStrategy, MessagePayload};
use rstest_bdd_macros::given;

#[given("an empty message board")]
fn empty_board(world: &mut BoardWorld) {
    world.last_message = None;
}

#[given("an empty message board assigning sequential identifiers")]
fn empty_sequential_board(world: &mut BoardWorld) {
    world.use_strategy(IdStrategy::Sequential);
}

#[given(r#"a message titled "{title}" with body "{body}" has been added"#)]
fn message_added(world: &mut BoardWorld, title: String, body: String) -> Result<(), eyre::Report> {
    let payload = MessagePayload::new(title, body, "").to_json();
    let created = run_async(world.service.add_message(&payload))
        .wrap_err("add message in scenario setup")?;
    world.original = Some(created.clone());
    world.last_message = Some(created);
    Ok(())
}
