mod debug_log;

pub use debug_log::{debug_log, DebugLog};

use crate::handler::Hook;
use std::fmt;
use std::sync::Arc;

/// Pipeline phases, in execution order around the route handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    BeforeAll,
    Before,
    After,
    AfterAll,
}

/// One registered hook. `order` is its position among hooks registered in
/// the same phase and scope.
#[derive(Clone)]
pub struct HookDescriptor {
    pub phase: Phase,
    pub order: usize,
    pub hook: Arc<dyn Hook>,
}

impl HookDescriptor {
    pub fn new(phase: Phase, order: usize, hook: Arc<dyn Hook>) -> Self {
        Self { phase, order, hook }
    }
}

impl fmt::Debug for HookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDescriptor")
            .field("phase", &self.phase)
            .field("order", &self.order)
            .field("hook", &self.hook.name())
            .finish()
    }
}

/// An ordered list of hooks for a single phase.
#[derive(Clone, Debug)]
pub(crate) struct HookList {
    phase: Phase,
    hooks: Vec<HookDescriptor>,
}

impl HookList {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            hooks: Vec::new(),
        }
    }

    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        let order = self.hooks.len();
        self.hooks.push(HookDescriptor::new(self.phase, order, hook));
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.hooks.iter()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }
}

/// Framework-wide `BeforeAll` / `AfterAll` hooks applied to every compiled route.
#[derive(Clone, Debug)]
pub struct GlobalHooks {
    pub(crate) before_all: HookList,
    pub(crate) after_all: HookList,
}

impl Default for GlobalHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHooks {
    pub fn new() -> Self {
        Self {
            before_all: HookList::new(Phase::BeforeAll),
            after_all: HookList::new(Phase::AfterAll),
        }
    }

    pub fn before_all<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.before_all.add(Arc::new(hook));
        self
    }

    pub fn after_all<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.after_all.add(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before_all.len() == 0 && self.after_all.len() == 0
    }
}
