//! Target registry
//!
//! Targets are owned by the animator and addressed by [`TargetId`]. Each
//! target keeps one [`Fragment`] shared by every tween driving it, so the
//! most recently updated tween wins per property.

use std::fmt;

use indexmap::IndexMap;
use kinema_core::TargetId;
use kinema_style::{Fragment, StyleTarget};
use slotmap::SlotMap;

/// Resolves selector strings the registry does not know
pub trait TargetResolver {
    fn resolve(&self, selector: &str) -> Vec<TargetId>;
}

impl<F> TargetResolver for F
where
    F: Fn(&str) -> Vec<TargetId>,
{
    fn resolve(&self, selector: &str) -> Vec<TargetId> {
        self(selector)
    }
}

/// What a tween animates
#[derive(Clone, Debug, PartialEq)]
pub enum Targets {
    Id(TargetId),
    Ids(Vec<TargetId>),
    /// A registered name, `name[index]`, or anything the resolver accepts
    Selector(String),
}

impl From<TargetId> for Targets {
    fn from(id: TargetId) -> Self {
        Targets::Id(id)
    }
}

impl From<Vec<TargetId>> for Targets {
    fn from(ids: Vec<TargetId>) -> Self {
        Targets::Ids(ids)
    }
}

impl From<&[TargetId]> for Targets {
    fn from(ids: &[TargetId]) -> Self {
        Targets::Ids(ids.to_vec())
    }
}

impl From<&str> for Targets {
    fn from(selector: &str) -> Self {
        Targets::Selector(selector.to_string())
    }
}

impl From<String> for Targets {
    fn from(selector: String) -> Self {
        Targets::Selector(selector)
    }
}

impl fmt::Display for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Targets::Id(id) => write!(f, "{id:?}"),
            Targets::Ids(ids) => write!(f, "{ids:?}"),
            Targets::Selector(selector) => f.write_str(selector),
        }
    }
}

pub(crate) struct TargetEntry {
    pub target: Box<dyn StyleTarget>,
    pub fragment: Option<Fragment>,
}

#[derive(Default)]
pub struct TargetRegistry {
    pub(crate) entries: SlotMap<TargetId, TargetEntry>,
    names: IndexMap<String, Vec<TargetId>>,
    resolver: Option<Box<dyn TargetResolver>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: Box<dyn StyleTarget>) -> TargetId {
        self.entries.insert(TargetEntry {
            target,
            fragment: None,
        })
    }

    /// Register a target under a selector name; names may group several
    pub fn insert_named(&mut self, name: &str, target: Box<dyn StyleTarget>) -> TargetId {
        let id = self.insert(target);
        self.names.entry(name.to_string()).or_default().push(id);
        id
    }

    pub fn remove(&mut self, id: TargetId) -> Option<Box<dyn StyleTarget>> {
        for ids in self.names.values_mut() {
            ids.retain(|t| *t != id);
        }
        self.entries.remove(id).map(|entry| entry.target)
    }

    pub fn get(&self, id: TargetId) -> Option<&dyn StyleTarget> {
        self.entries.get(id).map(|entry| entry.target.as_ref())
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut (dyn StyleTarget + 'static)> {
        self.entries.get_mut(id).map(|entry| entry.target.as_mut())
    }

    pub fn fragment(&self, id: TargetId) -> Option<&Fragment> {
        self.entries.get(id).and_then(|entry| entry.fragment.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_resolver(&mut self, resolver: Box<dyn TargetResolver>) {
        self.resolver = Some(resolver);
    }

    pub(crate) fn center(&self, id: TargetId) -> Option<(f64, f64)> {
        self.entries.get(id).and_then(|entry| entry.target.center())
    }

    /// Create the target's fragment from its current state if missing
    pub(crate) fn ensure_fragment(&mut self, id: TargetId) {
        if let Some(entry) = self.entries.get_mut(id) {
            if entry.fragment.is_none() {
                entry.fragment = Some(Fragment::new(entry.target.as_ref()));
            }
        }
    }

    /// Live targets matching `targets`, in order
    pub fn resolve(&self, targets: &Targets) -> Vec<TargetId> {
        let ids = match targets {
            Targets::Id(id) => vec![*id],
            Targets::Ids(ids) => ids.clone(),
            Targets::Selector(selector) => self.select(selector.trim()),
        };
        ids.into_iter()
            .filter(|id| self.entries.contains_key(*id))
            .collect()
    }

    fn select(&self, selector: &str) -> Vec<TargetId> {
        if let Some(ids) = self.names.get(selector) {
            return ids.clone();
        }
        if let Some((name, index)) = indexed(selector) {
            if let Some(ids) = self.names.get(name) {
                return ids.get(index).copied().into_iter().collect();
            }
        }
        match &self.resolver {
            Some(resolver) => resolver.resolve(selector),
            None => Vec::new(),
        }
    }
}

/// Split `name[3]` into `("name", 3)`
fn indexed(selector: &str) -> Option<(&str, usize)> {
    let (name, rest) = selector.split_once('[')?;
    let index = rest.strip_suffix(']')?.trim().parse().ok()?;
    Some((name.trim(), index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_style::testing::MemoryTarget;

    #[test]
    fn test_select_by_name_and_index() {
        let mut registry = TargetRegistry::new();
        let a = registry.insert_named(".box", Box::new(MemoryTarget::new()));
        let b = registry.insert_named(".box", Box::new(MemoryTarget::new()));
        let lone = registry.insert(Box::new(MemoryTarget::new()));

        assert_eq!(registry.resolve(&".box".into()), vec![a, b]);
        assert_eq!(registry.resolve(&".box[1]".into()), vec![b]);
        assert!(registry.resolve(&".box[5]".into()).is_empty());
        assert!(registry.resolve(&"#missing".into()).is_empty());
        assert_eq!(registry.resolve(&lone.into()), vec![lone]);
    }

    #[test]
    fn test_resolver_fallback() {
        let mut registry = TargetRegistry::new();
        let a = registry.insert(Box::new(MemoryTarget::new()));
        registry.set_resolver(Box::new(move |selector: &str| {
            if selector == "#hero" {
                vec![a]
            } else {
                Vec::new()
            }
        }));
        assert_eq!(registry.resolve(&"#hero".into()), vec![a]);
    }

    #[test]
    fn test_removed_targets_drop_out() {
        let mut registry = TargetRegistry::new();
        let a = registry.insert_named("item", Box::new(MemoryTarget::new()));
        let b = registry.insert_named("item", Box::new(MemoryTarget::new()));
        assert!(registry.remove(a).is_some());
        assert_eq!(registry.resolve(&"item".into()), vec![b]);
        assert_eq!(registry.resolve(&Targets::Ids(vec![a, b])), vec![b]);
        assert_eq!(registry.len(), 1);
    }
}
