use anyhow::{Context, Result};
use oca::{Entity, HostKind, ImageKind, Kind, Transport, UserKind, VmKind, VnetKind};
use serde::Serialize;
use tracing::info;

use crate::common::{self, KindArg};

#[derive(Serialize)]
struct Deleted<'a> {
    kind: &'a str,
    id: i64,
}

pub fn run(transport: &dyn Transport, kind: KindArg, id: i64, json: bool) -> Result<()> {
    let element = match kind {
        KindArg::Vm => delete::<VmKind>(transport, id)?,
        KindArg::Host => delete::<HostKind>(transport, id)?,
        KindArg::Image => delete::<ImageKind>(transport, id)?,
        KindArg::Vnet => delete::<VnetKind>(transport, id)?,
        KindArg::User => delete::<UserKind>(transport, id)?,
    };

    if json {
        common::print_json(&Deleted { kind: element, id })?;
    } else {
        println!("Deleted {element} {id}");
    }
    Ok(())
}

fn delete<K: Kind>(transport: &dyn Transport, id: i64) -> Result<&'static str> {
    let entity = Entity::<K>::new_with_id(transport, id)?;
    entity
        .delete()
        .with_context(|| format!("delete {} {id}", K::ELEMENT_NAME))?;
    info!(kind = K::ELEMENT_NAME, id, "deleted entity");
    Ok(K::ELEMENT_NAME)
}
