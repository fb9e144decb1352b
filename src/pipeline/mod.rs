//! Compiles route metadata into one call chain per route.
//!
//! Stage order is fixed:
//!
//! ```text
//! framework BeforeAll → controller BeforeAll → route Before
//!     → handler
//!     → route After → controller AfterAll → framework AfterAll
//! ```
//!
//! Stages run one at a time. Each receives the current response and returns
//! the one the next stage sees. Once a stage finalizes the response the rest
//! are skipped; the first error ends the chain and is returned as is.

use crate::controller::{Controller, ControllerRouteMap, RouteHandler};
use crate::handler::{Hook, HookFuture};
use crate::http::{Request, Response};
use crate::middleware::{GlobalHooks, HookDescriptor, Phase};
use crate::plugins::Services;
use crate::router::RouteConfig;
use std::fmt;
use std::sync::Arc;

pub type CallStackHandler = Arc<dyn Fn(Request, Response) -> HookFuture + Send + Sync>;

/// Where a stage sits in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Hook(Phase),
    Handler,
}

#[derive(Clone)]
pub struct Stage {
    pub phase: StagePhase,
    pub label: String,
    hook: Arc<dyn Hook>,
}

impl Stage {
    fn from_descriptor(descriptor: &HookDescriptor) -> Self {
        Self {
            phase: StagePhase::Hook(descriptor.phase),
            label: format!("{:?}#{} {}", descriptor.phase, descriptor.order, descriptor.hook.name()),
            hook: Arc::clone(&descriptor.hook),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("phase", &self.phase)
            .field("label", &self.label)
            .finish()
    }
}

/// Route handler bound to a controller instance.
struct BoundHandler<C> {
    controller: Arc<C>,
    handler: RouteHandler<C>,
    method_name: String,
}

impl<C: Controller> Hook for BoundHandler<C> {
    fn call(&self, req: Request, res: Response) -> HookFuture {
        (self.handler)(Arc::clone(&self.controller), req, res)
    }

    fn name(&self) -> &str {
        &self.method_name
    }
}

/// Folds `stages` into a single handler. `services` are attached to every
/// request entering the chain.
pub fn compose(stages: Vec<Stage>, services: Services) -> CallStackHandler {
    let stages: Arc<[Stage]> = stages.into();
    Arc::new(move |mut req: Request, res: Response| -> HookFuture {
        let stages = Arc::clone(&stages);
        req.attach_services(&services);
        Box::pin(async move {
            let mut res = res;
            for stage in stages.iter() {
                if res.is_finalized() {
                    tracing::trace!(stage = %stage.label, "response finalized, skipping remaining stages");
                    break;
                }
                tracing::trace!(stage = %stage.label, "running stage");
                res = stage.hook.call(req.clone(), res).await?;
            }
            Ok(res)
        })
    })
}

/// Stage list for one method of a controller, in execution order.
pub fn stages_for<C: Controller>(
    controller: &Arc<C>,
    map: &ControllerRouteMap<C>,
    globals: &GlobalHooks,
    method_name: &str,
) -> Option<Vec<Stage>> {
    let entry = map.get(method_name)?;
    let route = entry.route()?;

    let mut stages: Vec<Stage> = globals
        .before_all
        .iter()
        .chain(map.before_all_hooks())
        .chain(entry.before_hooks())
        .map(Stage::from_descriptor)
        .collect();

    stages.push(Stage {
        phase: StagePhase::Handler,
        label: format!("{}::{}", map.controller(), method_name),
        hook: Arc::new(BoundHandler {
            controller: Arc::clone(controller),
            handler: Arc::clone(&route.handler),
            method_name: method_name.to_string(),
        }),
    });

    stages.extend(
        entry
            .after_hooks()
            .chain(map.after_all_hooks())
            .chain(globals.after_all.iter())
            .map(Stage::from_descriptor),
    );

    Some(stages)
}

/// Compiles every routed method of `controller` into a [`RouteConfig`].
pub fn compile<C: Controller>(
    controller: Arc<C>,
    map: &ControllerRouteMap<C>,
    globals: &GlobalHooks,
    services: &Services,
) -> Vec<RouteConfig> {
    let mut routes = Vec::with_capacity(map.len());
    for entry in map.methods() {
        let Some(route) = entry.route() else {
            tracing::warn!(
                controller = map.controller(),
                method_name = %entry.method_name,
                "hooks registered for a method without a route, ignoring"
            );
            continue;
        };
        let Some(stages) = stages_for(&controller, map, globals, &entry.method_name) else {
            continue;
        };
        tracing::debug!(
            controller = map.controller(),
            method_name = %entry.method_name,
            method = %route.method,
            path = %route.path,
            stages = stages.len(),
            "compiled route"
        );
        routes.push(RouteConfig::new(
            route.method,
            &route.path,
            &entry.method_name,
            map.controller(),
            compose(stages, services.clone()),
        ));
    }
    routes
}
