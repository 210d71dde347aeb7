use anyhow::{Context, Result};
use oca::{Arg, HostKind, ImageKind, Kind, Pool, Transport, UserKind, VmKind, VnetKind};
use serde::Serialize;
use tracing::info;

use crate::common::{self, KindArg};

#[derive(Debug, Serialize, PartialEq)]
struct EntityRow {
    id: i64,
    name: Option<String>,
}

pub fn run(transport: &dyn Transport, kind: KindArg, filter: Option<i64>, json: bool) -> Result<()> {
    let args: Vec<Arg> = filter.map(Arg::Int).into_iter().collect();
    let rows = match kind {
        KindArg::Vm => rows::<VmKind>(transport, &args)?,
        KindArg::Host => rows::<HostKind>(transport, &args)?,
        KindArg::Image => rows::<ImageKind>(transport, &args)?,
        KindArg::Vnet => rows::<VnetKind>(transport, &args)?,
        KindArg::User => rows::<UserKind>(transport, &args)?,
    };

    if json {
        common::print_json(&rows)?;
        return Ok(());
    }

    if rows.is_empty() {
        println!("Pool is empty.");
        return Ok(());
    }

    println!("{:<8} {}", "ID", "NAME");
    for row in &rows {
        println!("{:<8} {}", row.id, row.name.as_deref().unwrap_or("-"));
    }

    Ok(())
}

fn rows<K: Kind>(transport: &dyn Transport, args: &[Arg]) -> Result<Vec<EntityRow>> {
    let mut pool = Pool::<K>::new(transport);
    pool.refresh(args)
        .with_context(|| format!("refresh {}", K::POOL_NAME))?;
    info!(pool = K::POOL_NAME, count = pool.len(), "listed pool");
    Ok(pool
        .iter()
        .map(|entity| EntityRow {
            id: entity.id(),
            name: entity.name().ok().map(str::to_string),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oca::TransportError;

    struct Listing(&'static str);

    impl Transport for Listing {
        fn call(&self, method: &str, _args: &[Arg]) -> Result<String, TransportError> {
            assert_eq!(method, "userpool.info");
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn rows_follow_pool_order() {
        let transport = Listing(
            "<USER_POOL><USER><ID>1</ID><NAME>alice</NAME></USER><USER><ID>0</ID></USER></USER_POOL>",
        );
        let rows = rows::<UserKind>(&transport, &[]).expect("rows");
        assert_eq!(
            rows,
            vec![
                EntityRow {
                    id: 1,
                    name: Some("alice".into())
                },
                EntityRow { id: 0, name: None },
            ]
        );
    }

    #[test]
    fn refresh_errors_carry_pool_context() {
        let transport = Listing("<VM_POOL/>");
        let err = rows::<UserKind>(&transport, &[]).unwrap_err();
        assert!(err.to_string().contains("USER_POOL"));
    }
}
