//! Ordered (key, element) registry backing session and request bookkeeping.
//!
//! A [`Registry`] is an owning ordered sequence of keyed elements. It backs
//! both the active-session set of an application context and the
//! pending-request queues of every client session:
//!
//! - O(1) [`append`](Registry::append) / [`prepend`](Registry::prepend)
//! - O(1) [`remove_last`](Registry::remove_last), which together with
//!   `append` gives stack (LIFO) semantics at the tail
//! - linear [`find`](Registry::find) / [`remove`](Registry::remove) driven
//!   by a [`Criterion`] (exact key or element predicate), resolving to the
//!   first match in head-to-tail order
//!
//! Keys need not be unique; duplicate keys always resolve to the
//! earliest-inserted element still present. The registry itself provides no
//! locking: share it across tasks behind external synchronization (the
//! entity layer wraps it in `Arc<tokio::sync::Mutex<_>>`).

use std::collections::VecDeque;

/// Search criterion for [`Registry::find`] and [`Registry::remove`].
///
/// The first element matching the criterion in head-to-tail order wins.
pub enum Criterion<'a, T> {
    /// Match the first node inserted under exactly this key.
    Key(u32),
    /// Match the first element the predicate accepts.
    Predicate(&'a dyn Fn(&T) -> bool),
}

#[derive(Debug)]
struct Node<T> {
    key: u32,
    element: T,
}

/// Owning ordered container of (key, element) pairs.
///
/// See the [module documentation](self) for the contract.
#[derive(Debug)]
pub struct Registry<T> {
    nodes: VecDeque<Node<T>>,
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            nodes: VecDeque::new(),
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the registry holds no elements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert an element at the head of the traversal order.
    pub fn prepend(&mut self, key: u32, element: T) {
        self.nodes.push_front(Node { key, element });
    }

    /// Insert an element at the tail of the traversal order.
    pub fn append(&mut self, key: u32, element: T) {
        self.nodes.push_back(Node { key, element });
    }

    /// Remove and return the most recently appended element not yet
    /// removed, or `None` if the registry is empty.
    pub fn remove_last(&mut self) -> Option<T> {
        self.nodes.pop_back().map(|node| node.element)
    }

    fn matches(node: &Node<T>, criterion: &Criterion<'_, T>) -> bool {
        match criterion {
            Criterion::Predicate(predicate) => predicate(&node.element),
            Criterion::Key(key) => node.key == *key,
        }
    }

    /// Return the first element matching the criterion, without mutating.
    ///
    /// An empty registry always answers `None`.
    pub fn find(&self, criterion: &Criterion<'_, T>) -> Option<&T> {
        self.nodes
            .iter()
            .find(|node| Self::matches(node, criterion))
            .map(|node| &node.element)
    }

    /// Unlink and return the first element matching the criterion.
    ///
    /// Ownership of the element returns to the caller; later elements keep
    /// their relative order. An empty registry always answers `None`.
    pub fn remove(&mut self, criterion: &Criterion<'_, T>) -> Option<T> {
        let index = self
            .nodes
            .iter()
            .position(|node| Self::matches(node, criterion))?;
        self.nodes.remove(index).map(|node| node.element)
    }

    /// Visit every (key, element) pair in head-to-tail order.
    ///
    /// The visitor cannot mutate the registry during traversal; it holds a
    /// shared borrow for the duration.
    pub fn for_each(&self, mut visitor: impl FnMut(u32, &T)) {
        for node in &self.nodes {
            visitor(node.key, &node.element);
        }
    }

    /// Iterate over (key, element) pairs in head-to-tail order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.nodes.iter().map(|node| (node.key, &node.element))
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
