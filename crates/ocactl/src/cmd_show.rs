use anyhow::{bail, Context, Result};
use oca::{Entity, HostKind, ImageKind, Kind, Pool, Transport, UserKind, VmKind, VnetKind};
use serde_json::{Map, Value as JsonValue};
use tracing::info;

use crate::common::{self, KindArg};

/// How the entity to show is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(i64),
    Name(String),
}

impl Selector {
    pub fn from_args(id: Option<i64>, name: Option<String>) -> Result<Self> {
        match (id, name) {
            (Some(id), None) => Ok(Selector::Id(id)),
            (None, Some(name)) => Ok(Selector::Name(name)),
            (Some(id), Some(_)) => bail!("specify either --id or --name, not both (using {id})"),
            (None, None) => bail!("an entity must be selected via --id or --name"),
        }
    }
}

pub fn run(transport: &dyn Transport, kind: KindArg, selector: Selector, json: bool) -> Result<()> {
    let fields = match kind {
        KindArg::Vm => fetch::<VmKind>(transport, &selector)?,
        KindArg::Host => fetch::<HostKind>(transport, &selector)?,
        KindArg::Image => fetch::<ImageKind>(transport, &selector)?,
        KindArg::Vnet => fetch::<VnetKind>(transport, &selector)?,
        KindArg::User => fetch::<UserKind>(transport, &selector)?,
    };

    if json {
        return common::print_json(&fields);
    }

    for (name, value) in &fields {
        match value {
            JsonValue::String(text) => println!("{:<16} {}", name.to_uppercase(), text),
            other => println!("{:<16} {}", name.to_uppercase(), other),
        }
    }
    Ok(())
}

fn fetch<K: Kind>(transport: &dyn Transport, selector: &Selector) -> Result<Map<String, JsonValue>> {
    match selector {
        Selector::Id(id) => {
            let mut entity = Entity::<K>::new_with_id(transport, *id)?;
            entity
                .refresh()
                .with_context(|| format!("fetch {} {id}", K::ELEMENT_NAME))?;
            info!(kind = K::ELEMENT_NAME, id, "fetched entity");
            common::view_json(entity.view())
        }
        Selector::Name(name) => {
            let mut pool = Pool::<K>::new(transport);
            pool.refresh(&[])
                .with_context(|| format!("refresh {}", K::POOL_NAME))?;
            let entity = pool.find_by_name(name)?;
            info!(kind = K::ELEMENT_NAME, id = entity.id(), "found entity by name");
            common::view_json(entity.view())
        }
    }
}
