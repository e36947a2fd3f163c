use std::collections::BTreeMap;
use std::sync::Arc;

use super::traits::MessageHandler;

/// Registry mapping message names to their single handler
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn MessageHandler>>,
}

/// Result of [`HandlerRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    Replaced,
    Unchanged,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Registration {
        let name = name.into();
        match self.handlers.get(&name) {
            Some(existing) if same_handler(existing, &handler) => Registration::Unchanged,
            Some(_) => {
                self.handlers.insert(name, handler);
                Registration::Replaced
            }
            None => {
                self.handlers.insert(name, handler);
                Registration::Added
            }
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Remove `name` only while it is still bound to `handler`
    pub fn unregister_if_same(&mut self, name: &str, handler: &Arc<dyn MessageHandler>) -> bool {
        match self.handlers.get(name) {
            Some(existing) if same_handler(existing, handler) => {
                self.handlers.remove(name);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn same_handler(a: &Arc<dyn MessageHandler>, b: &Arc<dyn MessageHandler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
