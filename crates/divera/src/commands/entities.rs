//! Derived entities of every subscription with their current states.

use serde::Serialize;
use tabled::Tabled;

use divera_core::entity::Attributes;
use divera_core::{AccountConfig, BoundEntity, EntitySet, EntityState, StateValue};

use crate::cli::{EntitiesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// An entity flattened together with its state, as printed.
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub unique_id: String,
    pub name: String,
    pub platform: String,
    pub icon: &'static str,
    pub value: StateValue,
    pub available: bool,
    pub attributes: Attributes,
}

impl EntityView {
    pub fn new(entity: &BoundEntity, state: &EntityState) -> Self {
        Self {
            unique_id: entity.unique_id.clone(),
            name: entity.name.clone(),
            platform: entity.platform.to_string(),
            icon: entity.icon,
            value: state.value.clone(),
            available: state.available,
            attributes: state.attributes.clone(),
        }
    }

    pub fn state_text(&self, color: bool) -> String {
        output::paint_state(&self.value, self.available, color)
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    unique_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Views of the entities in `set` that pass the filters.
fn views(set: &EntitySet, args: &EntitiesArgs) -> Vec<EntityView> {
    set.current()
        .iter()
        .filter(|(entity, _)| {
            args.platform
                .as_deref()
                .is_none_or(|p| entity.platform.to_string() == p)
                && (args.all || !entity.is_action())
        })
        .map(|(entity, state)| EntityView::new(entity, state))
        .collect()
}

pub async fn handle(
    account: &AccountConfig,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let group = util::start_group(account, global).await?;

    let mut all = Vec::new();
    for coordinator in group.coordinators() {
        let set = EntitySet::for_coordinator(coordinator, account.vehicle_name_mode);
        all.extend(views(&set, &args));
        set.detach();
    }
    group.shutdown().await;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &all,
        |v| EntityRow {
            unique_id: v.unique_id.clone(),
            name: v.name.clone(),
            platform: v.platform.clone(),
            state: v.state_text(color),
        },
        |v| format!("{}\t{}", v.unique_id, v.state_text(false)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
