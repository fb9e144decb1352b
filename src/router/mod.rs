use crate::error::ConfigError;
use crate::handler::HookFuture;
use crate::http::{Method, Request, Response};
use crate::pipeline::CallStackHandler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Dispatch-ready route: where it lives and the compiled chain behind it.
#[derive(Clone)]
pub struct RouteConfig {
    pub method: Method,
    pub path: String,
    pub method_name: String,
    pub controller: &'static str,
    pub call_stack_handler: CallStackHandler,
}

impl RouteConfig {
    pub fn new(
        method: Method,
        path: &str,
        method_name: &str,
        controller: &'static str,
        call_stack_handler: CallStackHandler,
    ) -> Self {
        Self {
            method,
            path: normalize_path(path),
            method_name: method_name.to_string(),
            controller,
            call_stack_handler,
        }
    }

    pub fn call(&self, req: Request, res: Response) -> HookFuture {
        (self.call_stack_handler)(req, res)
    }

    fn is_dynamic(&self) -> bool {
        self.path.contains(':')
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("method_name", &self.method_name)
            .field("controller", &self.controller)
            .finish()
    }
}

/// Ordered collection of compiled routes.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteConfig>>,
    static_routes: HashMap<(Method, String), usize>,
    dynamic_routes: Vec<usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route. Two routes may not share a method and path; parameter
    /// names do not count, so `/books/:id` and `/books/:slug` collide.
    pub fn insert(&mut self, route: RouteConfig) -> Result<(), ConfigError> {
        let shape = path_shape(&route.path);
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method == route.method && path_shape(&r.path) == shape)
        {
            return Err(ConfigError::RouteConflict {
                method: route.method.to_string(),
                path: route.path.clone(),
                existing: format!("{}::{}", existing.controller, existing.method_name),
                incoming: format!("{}::{}", route.controller, route.method_name),
            });
        }

        let index = self.routes.len();
        if route.is_dynamic() {
            self.dynamic_routes.push(index);
        } else {
            self.static_routes.insert((route.method, route.path.clone()), index);
        }
        self.routes.push(Arc::new(route));
        Ok(())
    }

    /// Finds the route for `method` and `path`, with any `:name` parameters
    /// captured from the path. Static paths win over dynamic ones.
    pub fn find(&self, method: Method, path: &str) -> Option<(Arc<RouteConfig>, HashMap<String, String>)> {
        let path = normalize_path(path);
        if let Some(&index) = self.static_routes.get(&(method, path.clone())) {
            return Some((Arc::clone(&self.routes[index]), HashMap::new()));
        }

        self.dynamic_routes
            .iter()
            .map(|&index| &self.routes[index])
            .filter(|route| route.method == method)
            .find_map(|route| match_dynamic_path(&route.path, &path).map(|params| (Arc::clone(route), params)))
    }

    /// Methods registered for `path`, used to tell 404 from 405.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .filter(|route| route.path == path || (route.is_dynamic() && match_dynamic_path(&route.path, &path).is_some()))
            .map(|route| route.method)
            .collect()
    }

    pub fn by_method_name(&self, method_name: &str) -> Option<&RouteConfig> {
        self.routes
            .iter()
            .map(Arc::as_ref)
            .find(|route| route.method_name == method_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteConfig> {
        self.routes.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn match_dynamic_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let path_parts: Vec<&str> = path.split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = pattern_part.strip_prefix(':') {
            if path_part.is_empty() {
                return None;
            }
            params.insert(name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}
