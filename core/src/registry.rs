//! # Registry: Per-Element Extension Records
//!
//! Controllers attach their state to elements without touching the elements
//! themselves. Each element gets an [`Extensions`] record (a TypeMap), and each
//! controller owns exactly one type in it: a form keeps its `FormState`, a zone
//! its `ZoneState`, and so on.
//!
//! ## Philosophy
//! > Types = Slots. Asking for a controller that was never attached is `None`, not a panic.

use crate::dom::NodeId;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-keyed record attached to a single element.
#[derive(Default)]
pub struct Extensions {
    slots: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.slots.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The value of type `T`, inserting `init()` first when absent.
    pub fn get_or_insert_with<T: Send + Sync + 'static>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        let slot = self
            .slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()));
        match slot.downcast_mut() {
            Some(value) => value,
            // Slots are keyed by their own TypeId.
            None => unreachable!("extension slot holds a foreign type"),
        }
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("slot_count", &self.slots.len())
            .finish()
    }
}

/// Extension records for every element that has one.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<NodeId, Extensions>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, node: NodeId) -> Option<&T> {
        self.records.get(&node)?.get()
    }

    pub fn get_mut<T: 'static>(&mut self, node: NodeId) -> Option<&mut T> {
        self.records.get_mut(&node)?.get_mut()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, node: NodeId, value: T) {
        self.records.entry(node).or_default().insert(value);
    }

    pub fn contains<T: 'static>(&self, node: NodeId) -> bool {
        self.records.get(&node).is_some_and(Extensions::contains::<T>)
    }

    pub fn get_or_insert_with<T: Send + Sync + 'static>(
        &mut self,
        node: NodeId,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        self.records.entry(node).or_default().get_or_insert_with(init)
    }

    pub fn remove<T: 'static>(&mut self, node: NodeId) -> Option<T> {
        let record = self.records.get_mut(&node)?;
        let value = record.remove::<T>();
        if record.is_empty() {
            self.records.remove(&node);
        }
        value
    }

    /// Drop every record belonging to `node`.
    pub fn forget(&mut self, node: NodeId) {
        self.records.remove(&node);
    }

    /// Elements that currently hold a `T`.
    pub fn nodes_with<T: 'static>(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .records
            .iter()
            .filter(|(_, record)| record.contains::<T>())
            .map(|(node, _)| *node)
            .collect();
        nodes.sort();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[test]
    fn test_extensions_insert_and_get() {
        let mut ext = Extensions::new();
        ext.insert(42i32);
        ext.insert("hello".to_string());

        assert_eq!(ext.get::<i32>(), Some(&42));
        assert_eq!(ext.get::<String>(), Some(&"hello".to_string()));
        assert_eq!(ext.get::<f64>(), None);
    }

    #[test]
    fn test_registry_is_keyed_by_element() {
        let mut doc = Document::new();
        let a = doc.create_element("div", Vec::new());
        let b = doc.create_element("div", Vec::new());

        let mut registry = Registry::new();
        registry.insert(a, Marker(1));
        assert_eq!(registry.get::<Marker>(a), Some(&Marker(1)));
        assert!(!registry.contains::<Marker>(b));

        registry.get_or_insert_with(b, || Marker(2)).0 += 1;
        assert_eq!(registry.get_or_insert_with(b, || Marker(100)), &mut Marker(3));
        assert_eq!(registry.get::<Marker>(b), Some(&Marker(3)));
        assert_eq!(registry.nodes_with::<Marker>(), vec![a, b]);

        assert_eq!(registry.remove::<Marker>(a), Some(Marker(1)));
        registry.forget(b);
        assert!(registry.nodes_with::<Marker>().is_empty());
    }
}
