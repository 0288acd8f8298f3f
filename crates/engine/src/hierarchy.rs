//! Supertype strategies over an explicit [`TypeGraph`].
//!
//! Both strategies walk the same declared parent links and differ only in
//! where interface parents land relative to the superclass chain. The graph's
//! root type never appears mid-walk; `root_last` decides whether it closes the
//! sequence.
//!
//! Subtyping is answered from the walk itself, so narrowing a declared type
//! never drops it from the dispatch sequence.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use missive_core::{SupertypeStrategy, TypeGraph, TypeKey};

/// The whole superclass chain first, then every interface parent
/// breadth-first.
///
/// For `Email: Message + Examinable` and `Message: Serializable`, the walk of
/// `Email` is `Message, Examinable, Serializable`.
#[derive(Debug, Clone)]
pub struct SuperclassFirst {
    graph: Arc<TypeGraph>,
    root_last: bool,
}

impl SuperclassFirst {
    pub fn new(graph: Arc<TypeGraph>) -> Self {
        Self {
            graph,
            root_last: false,
        }
    }

    /// Append the graph's root type to every walk.
    pub fn root_last(mut self, root_last: bool) -> Self {
        self.root_last = root_last;
        self
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }
}

impl SupertypeStrategy for SuperclassFirst {
    fn hierarchy_of<'a>(&'a self, ty: &TypeKey) -> Box<dyn Iterator<Item = TypeKey> + 'a> {
        let mut walk = Walk::new(&self.graph, ty);

        let chain = walk.superclass_chain(ty);
        for class in &chain {
            walk.emit(class);
        }
        let mut queue: VecDeque<TypeKey> = std::iter::once(ty)
            .chain(chain.iter())
            .flat_map(|t| self.graph.interfaces(t).iter().cloned())
            .collect();
        walk.drain_breadth_first(&mut queue);

        Box::new(walk.finish(self.root_last).into_iter())
    }
}

/// At every level, the interface parents breadth-first before the next
/// superclass.
///
/// For `Email: Message + Examinable` and `Message: Serializable`, the walk of
/// `Email` is `Examinable, Message, Serializable`.
#[derive(Debug, Clone)]
pub struct InterfacesFirst {
    graph: Arc<TypeGraph>,
    root_last: bool,
}

impl InterfacesFirst {
    pub fn new(graph: Arc<TypeGraph>) -> Self {
        Self {
            graph,
            root_last: false,
        }
    }

    pub fn root_last(mut self, root_last: bool) -> Self {
        self.root_last = root_last;
        self
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }
}

impl SupertypeStrategy for InterfacesFirst {
    fn hierarchy_of<'a>(&'a self, ty: &TypeKey) -> Box<dyn Iterator<Item = TypeKey> + 'a> {
        let mut walk = Walk::new(&self.graph, ty);

        let mut level = Some(ty.clone());
        while let Some(current) = level {
            let mut queue: VecDeque<TypeKey> = self.graph.interfaces(&current).iter().cloned().collect();
            walk.drain_breadth_first(&mut queue);

            level = self
                .graph
                .superclass(&current)
                .filter(|parent| !walk.is_root(parent))
                .cloned();
            if let Some(parent) = &level {
                if !walk.emit(parent) {
                    break;
                }
            }
        }

        Box::new(walk.finish(self.root_last).into_iter())
    }
}

// ── Internal ──────────────────────────────────────────────

/// Accumulates one de-duplicated walk.
struct Walk<'g> {
    graph: &'g TypeGraph,
    origin: TypeKey,
    seen: HashSet<TypeKey>,
    order: Vec<TypeKey>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g TypeGraph, origin: &TypeKey) -> Self {
        Self {
            graph,
            origin: origin.clone(),
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    fn is_root(&self, ty: &TypeKey) -> bool {
        self.graph.root() == Some(ty)
    }

    /// Record `ty` unless it is the origin, the root or already walked.
    fn emit(&mut self, ty: &TypeKey) -> bool {
        if *ty == self.origin || self.is_root(ty) || !self.seen.insert(ty.clone()) {
            return false;
        }
        self.order.push(ty.clone());
        true
    }

    fn superclass_chain(&self, ty: &TypeKey) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        let mut current = self.graph.superclass(ty);
        while let Some(parent) = current {
            if self.is_root(parent) || chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = self.graph.superclass(parent);
        }
        chain
    }

    /// Walk interface parents level by level. An interface's own superclass
    /// (if one was declared) is visited with its interfaces.
    fn drain_breadth_first(&mut self, queue: &mut VecDeque<TypeKey>) {
        while let Some(next) = queue.pop_front() {
            if !self.emit(&next) {
                continue;
            }
            queue.extend(self.graph.interfaces(&next).iter().cloned());
            if let Some(parent) = self.graph.superclass(&next) {
                queue.push_back(parent.clone());
            }
        }
    }

    fn finish(mut self, root_last: bool) -> Vec<TypeKey> {
        if root_last {
            if let Some(root) = self.graph.root() {
                if *root != self.origin {
                    self.order.push(root.clone());
                }
            }
        }
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &'static str) -> TypeKey {
        TypeKey::from_static(name)
    }

    fn mail_graph() -> Arc<TypeGraph> {
        let mut graph = TypeGraph::with_root("object");
        graph
            .declare("email", Some(key("message")), [key("examinable")])
            .unwrap();
        graph.implements("message", [key("serializable")]).unwrap();
        graph.implements("examinable", [key("describable")]).unwrap();
        Arc::new(graph)
    }

    fn walk(strategy: &dyn SupertypeStrategy, ty: &'static str) -> Vec<String> {
        strategy
            .hierarchy_of(&key(ty))
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn superclass_first_walks_chain_then_interfaces() {
        let strategy = SuperclassFirst::new(mail_graph());
        assert_eq!(
            walk(&strategy, "email"),
            ["message", "examinable", "serializable", "describable"]
        );
    }

    #[test]
    fn interfaces_first_walks_interfaces_per_level() {
        let strategy = InterfacesFirst::new(mail_graph());
        assert_eq!(
            walk(&strategy, "email"),
            ["examinable", "describable", "message", "serializable"]
        );
    }

    #[test]
    fn root_is_appended_only_when_asked() {
        let graph = mail_graph();
        let with_root = SuperclassFirst::new(Arc::clone(&graph)).root_last(true);
        let without = SuperclassFirst::new(graph);

        assert_eq!(walk(&with_root, "email").last().map(String::as_str), Some("object"));
        assert!(!walk(&without, "email").contains(&"object".to_string()));
        assert!(walk(&with_root, "object").is_empty());
    }

    #[test]
    fn walk_excludes_self_and_is_deterministic() {
        let strategy = InterfacesFirst::new(mail_graph()).root_last(true);
        let first = walk(&strategy, "email");
        let second = walk(&strategy, "email");
        assert_eq!(first, second);
        assert!(!first.contains(&"email".to_string()));
    }

    #[test]
    fn diamonds_are_visited_once() {
        let mut graph = TypeGraph::new();
        graph.implements("left", [key("top")]).unwrap();
        graph.implements("right", [key("top")]).unwrap();
        graph.implements("bottom", [key("left"), key("right")]).unwrap();
        let strategy = SuperclassFirst::new(Arc::new(graph));

        assert_eq!(walk(&strategy, "bottom"), ["left", "right", "top"]);
    }

    #[test]
    fn undeclared_types_have_no_ancestors() {
        let strategy = SuperclassFirst::new(mail_graph());
        assert!(walk(&strategy, "string").is_empty());
    }

    #[test]
    fn subtyping_follows_the_graph() {
        let strategy = SuperclassFirst::new(mail_graph());
        assert!(strategy.is_subtype(&key("email"), &key("describable")));
        assert!(!strategy.is_subtype(&key("message"), &key("email")));
        assert_eq!(strategy.narrow(&key("message"), &key("email")), key("email"));
        assert_eq!(strategy.narrow(&key("message"), &key("string")), key("message"));
    }

    #[test]
    fn root_counts_as_ancestor_only_when_walked() {
        let graph = mail_graph();
        let without = InterfacesFirst::new(Arc::clone(&graph));
        let with_root = InterfacesFirst::new(graph).root_last(true);

        assert!(!without.is_subtype(&key("email"), &key("object")));
        assert_eq!(without.narrow(&key("object"), &key("email")), key("object"));

        assert!(with_root.is_subtype(&key("email"), &key("object")));
        assert_eq!(with_root.narrow(&key("object"), &key("email")), key("email"));
    }
}
