use super::{Controller, ControllerRouteMap, RouteMapBuilder};
use lazy_static::lazy_static;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

type AnyMap = Arc<dyn Any + Send + Sync>;
type Slot = Arc<OnceLock<AnyMap>>;

lazy_static! {
    // One slot per controller type; the slot is filled on first use.
    static ref ROUTE_MAPS: RwLock<HashMap<TypeId, Slot>> = RwLock::new(HashMap::new());
}

fn slot_for(key: TypeId) -> Slot {
    let cached = ROUTE_MAPS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&key)
        .cloned();
    match cached {
        Some(slot) => slot,
        None => Arc::clone(
            ROUTE_MAPS
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .entry(key)
                .or_default(),
        ),
    }
}

/// Returns the route map for `C`, running [`Controller::define`] the first
/// time the type is seen.
///
/// Concurrent first callers wait for a single `define`. The registry lock is
/// not held while it runs, so `define` may look up other controllers but not
/// its own type.
pub fn route_map<C: Controller>() -> Arc<ControllerRouteMap<C>> {
    let slot = slot_for(TypeId::of::<C>());
    let map = slot.get_or_init(|| {
        let mut builder = RouteMapBuilder::<C>::new();
        C::define(&mut builder);
        tracing::debug!(controller = C::controller_name(), "route map defined");
        Arc::new(builder.build()) as AnyMap
    });

    match Arc::clone(map).downcast::<ControllerRouteMap<C>>() {
        Ok(map) => map,
        Err(_) => unreachable!("route maps are keyed by their controller type"),
    }
}
