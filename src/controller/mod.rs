//! Route metadata for controllers.
//!
//! A controller type describes its routes once, through [`Controller::define`].
//! The resulting [`ControllerRouteMap`] is cached per type for the lifetime of
//! the process and is read-only afterwards; every instance of the controller
//! compiles against the same map.
//!
//! ```rust,ignore
//! struct Books;
//!
//! impl Books {
//!     fn index(self: Arc<Self>, _req: Request, res: Response) -> Response {
//!         res
//!     }
//! }
//!
//! impl Controller for Books {
//!     fn define(routes: &mut RouteMapBuilder<Self>) {
//!         routes
//!             .action("index", Method::GET, "/books", Self::index)
//!             .before("index", debug_log("listing books"));
//!     }
//! }
//! ```

mod registry;

pub use registry::route_map;

use crate::handler::{Hook, HookFuture, HookOutput, HookResult};
use futures::future;
use crate::http::{Method, Request, Response};
use crate::middleware::{HookDescriptor, HookList, Phase};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type RouteHandler<C> = Arc<dyn Fn(Arc<C>, Request, Response) -> HookFuture + Send + Sync>;

pub trait Controller: Send + Sync + Sized + 'static {
    /// Registers routes and hooks. Called when the type's route map is first needed.
    fn define(routes: &mut RouteMapBuilder<Self>);

    fn controller_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// HTTP binding of a controller method.
pub struct RouteSpec<C> {
    pub method: Method,
    pub path: String,
    pub(crate) handler: RouteHandler<C>,
}

impl<C> Clone for RouteSpec<C> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Everything registered against one method name.
pub struct MethodEntry<C> {
    pub method_name: String,
    pub(crate) route: Option<RouteSpec<C>>,
    pub(crate) before: HookList,
    pub(crate) after: HookList,
}

impl<C> MethodEntry<C> {
    fn new(method_name: &str) -> Self {
        Self {
            method_name: method_name.to_string(),
            route: None,
            before: HookList::new(Phase::Before),
            after: HookList::new(Phase::After),
        }
    }

    pub fn route(&self) -> Option<&RouteSpec<C>> {
        self.route.as_ref()
    }

    pub fn before_hooks(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.before.iter()
    }

    pub fn after_hooks(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.after.iter()
    }
}

pub struct ControllerRouteMap<C> {
    controller: &'static str,
    methods: Vec<MethodEntry<C>>,
    index: HashMap<String, usize>,
    pub(crate) before_all: HookList,
    pub(crate) after_all: HookList,
}

impl<C> ControllerRouteMap<C> {
    pub fn controller(&self) -> &'static str {
        self.controller
    }

    pub fn get(&self, method_name: &str) -> Option<&MethodEntry<C>> {
        self.index.get(method_name).map(|&i| &self.methods[i])
    }

    /// Entries in the order their method names were first registered.
    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry<C>> {
        self.methods.iter()
    }

    pub fn before_all_hooks(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.before_all.iter()
    }

    pub fn after_all_hooks(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.after_all.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<C> fmt::Debug for ControllerRouteMap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRouteMap")
            .field("controller", &self.controller)
            .field("methods", &self.index.keys().collect::<Vec<_>>())
            .field("before_all", &self.before_all.len())
            .field("after_all", &self.after_all.len())
            .finish()
    }
}

pub struct RouteMapBuilder<C> {
    map: ControllerRouteMap<C>,
}

impl<C: Controller> RouteMapBuilder<C> {
    pub(crate) fn new() -> Self {
        Self {
            map: ControllerRouteMap {
                controller: C::controller_name(),
                methods: Vec::new(),
                index: HashMap::new(),
                before_all: HookList::new(Phase::BeforeAll),
                after_all: HookList::new(Phase::AfterAll),
            },
        }
    }

    fn entry(&mut self, method_name: &str) -> &mut MethodEntry<C> {
        let methods = &mut self.map.methods;
        let i = *self
            .map
            .index
            .entry(method_name.to_string())
            .or_insert_with(|| {
                methods.push(MethodEntry::new(method_name));
                methods.len() - 1
            });
        &mut self.map.methods[i]
    }

    /// Binds `method_name` to an HTTP method and path.
    ///
    /// Binding the same method name again replaces the earlier binding; hooks
    /// already registered for it are kept.
    pub fn action<F, R>(&mut self, method_name: &str, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request, Response) -> R + Send + Sync + 'static,
        R: HookOutput,
    {
        let controller = self.map.controller;
        let entry = self.entry(method_name);
        if let Some(previous) = &entry.route {
            tracing::warn!(
                controller,
                method_name,
                previous = %format!("{} {}", previous.method, previous.path),
                replacement = %format!("{} {}", method, path),
                "route registered twice, overwriting"
            );
        }
        entry.route = Some(RouteSpec {
            method,
            path: path.to_string(),
            handler: Arc::new(move |controller: Arc<C>, req: Request, res: Response| -> HookFuture {
                handler(controller, req, res).into_hook_future()
            }),
        });
        self
    }

    /// Like [`action`](Self::action) for synchronous handlers that may fail.
    pub fn try_action<F>(&mut self, method_name: &str, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request, Response) -> HookResult + Send + Sync + 'static,
    {
        self.action(method_name, method, path, move |controller: Arc<C>, req: Request, res: Response| {
            future::ready(handler(controller, req, res))
        })
    }

    pub fn before<H: Hook>(&mut self, method_name: &str, hook: H) -> &mut Self {
        self.entry(method_name).before.add(Arc::new(hook));
        self
    }

    pub fn after<H: Hook>(&mut self, method_name: &str, hook: H) -> &mut Self {
        self.entry(method_name).after.add(Arc::new(hook));
        self
    }

    /// Hook run ahead of every route of this controller.
    pub fn before_all<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.map.before_all.add(Arc::new(hook));
        self
    }

    /// Hook run after every route of this controller.
    pub fn after_all<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.map.after_all.add(Arc::new(hook));
        self
    }

    pub(crate) fn build(self) -> ControllerRouteMap<C> {
        self.map
    }
}
