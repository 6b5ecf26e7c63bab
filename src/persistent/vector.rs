//! Persistent (immutable) vector based on a size-annotated 32-way trie.
//!
//! This module provides [`PersistentVector`], an immutable dynamic array
//! that uses structural sharing for efficient operations, together with its
//! mutable builder [`TransientVector`] and the fixed-capacity
//! [`BoundedVector`].
//!
//! # Overview
//!
//! `PersistentVector` keeps its middle part in a B+-tree-like trie whose
//! branches record the cumulative size of their children, so positions can
//! be found by descending the size tables. Two inline buffers of up to 32
//! elements sit at either end of the trie:
//!
//! - O(log32 N) random access and update
//! - amortized O(1) `push_back`, `push_front`, `pop_back`, `pop_front`
//!   (the trie is touched only once per 32 edge operations)
//! - O(log32 N) positional `insert` and `remove`
//! - O(log N) `split_at`, `slice` and `append`
//! - O(1) len and `is_empty`
//!
//! All operations return new vectors without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Internal Structure
//!
//! The vector consists of:
//! - A head buffer (up to 32 elements) for efficient prepend
//! - An optional trie of leaves holding at most 32 elements each
//! - A tail buffer (up to 32 elements) for efficient append
//!
//! # Examples
//!
//! ```rust
//! use champ_collections::persistent::PersistentVector;
//!
//! let vector = PersistentVector::new()
//!     .push_back(1)
//!     .push_back(2)
//!     .push_back(3);
//!
//! assert_eq!(vector.get(0), Some(&1));
//! assert_eq!(vector.get(1), Some(&2));
//! assert_eq!(vector.get(2), Some(&3));
//!
//! // Structural sharing: the original vector is preserved
//! let extended = vector.push_front(0);
//! assert_eq!(vector.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4);   // New vector
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::rc::Rc;

use arrayvec::ArrayVec;

use super::ReferenceCounter;
use super::cursor::VectorCursor;
use super::error::CapacityError;
use super::owner::Owner;

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of children of a branch and of elements of a leaf.
const BRANCHING_FACTOR: usize = 32;

/// After a removal, a child narrower than this is merged into a neighbour
/// when the two fit in one node.
const MERGE_THRESHOLD: usize = BRANCHING_FACTOR / 4;

type Buffer<T> = ArrayVec<T, BRANCHING_FACTOR>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
}

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure of the trie.
#[derive(Clone)]
enum Node<T> {
    /// Up to 32 elements.
    Leaf(Vec<T>),
    /// Up to 32 children of equal height. `sizes[i]` is the number of
    /// elements held by `children[..=i]`.
    Branch {
        sizes: Vec<usize>,
        children: Vec<ReferenceCounter<Node<T>>>,
    },
}

/// Returns the child of a size table that holds `index`.
fn locate(sizes: &[usize], index: usize) -> Option<usize> {
    let slot = sizes.partition_point(|&end| end <= index);
    (slot < sizes.len()).then_some(slot)
}

/// Returns the child that receives an insertion at `index`.
fn insertion_slot(sizes: &[usize], index: usize) -> usize {
    sizes
        .partition_point(|&end| end <= index)
        .min(sizes.len().saturating_sub(1))
}

/// Returns the number of elements before child `slot`.
fn offset(sizes: &[usize], slot: usize) -> usize {
    if slot == 0 { 0 } else { sizes[slot - 1] }
}

/// Recomputes the size table from child `from` onward.
fn refresh<T>(sizes: &mut Vec<usize>, children: &[ReferenceCounter<Node<T>>], from: usize) {
    let from = from.min(sizes.len()).min(children.len());
    sizes.truncate(from);
    let mut total = sizes.last().copied().unwrap_or(0);
    for child in &children[from..] {
        total += child.len();
        sizes.push(total);
    }
}

impl<T> Node<T> {
    fn branch(children: Vec<ReferenceCounter<Self>>) -> Self {
        let mut sizes = Vec::with_capacity(children.len());
        refresh(&mut sizes, &children, 0);
        Self::Branch { sizes, children }
    }

    /// Number of elements below this node.
    fn len(&self) -> usize {
        match self {
            Self::Leaf(elements) => elements.len(),
            Self::Branch { sizes, .. } => sizes.last().copied().unwrap_or(0),
        }
    }

    /// Number of occupied slots of this node.
    fn width(&self) -> usize {
        match self {
            Self::Leaf(elements) => elements.len(),
            Self::Branch { children, .. } => children.len(),
        }
    }

    fn get(&self, mut index: usize) -> Option<&T> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(elements) => return elements.get(index),
                Self::Branch { sizes, children } => {
                    let slot = locate(sizes, index)?;
                    index -= offset(sizes, slot);
                    node = &children[slot];
                }
            }
        }
    }

    /// Returns the leaf holding `index` and the position of its first element.
    fn leaf_at(&self, mut index: usize) -> Option<(&[T], usize)> {
        let mut node = self;
        let mut start = 0;
        loop {
            match node {
                Self::Leaf(elements) => {
                    return (index < elements.len()).then_some((elements.as_slice(), start));
                }
                Self::Branch { sizes, children } => {
                    let slot = locate(sizes, index)?;
                    let skipped = offset(sizes, slot);
                    index -= skipped;
                    start += skipped;
                    node = &children[slot];
                }
            }
        }
    }
}

impl<T: Clone> Node<T> {
    fn set(slot: &mut ReferenceCounter<Self>, index: usize, element: T) -> T {
        match ReferenceCounter::make_mut(slot) {
            Self::Leaf(elements) => std::mem::replace(&mut elements[index], element),
            Self::Branch { sizes, children } => {
                let child = insertion_slot(sizes, index);
                let skipped = offset(sizes, child);
                Self::set(&mut children[child], index - skipped, element)
            }
        }
    }

    /// Inserts `element` at `index`, returning the right half of the node
    /// if it had to split.
    fn insert(
        slot: &mut ReferenceCounter<Self>,
        index: usize,
        element: T,
    ) -> Option<ReferenceCounter<Self>> {
        match ReferenceCounter::make_mut(slot) {
            Self::Leaf(elements) => {
                elements.insert(index, element);
                (elements.len() > BRANCHING_FACTOR).then(|| {
                    ReferenceCounter::new(Self::Leaf(elements.split_off(elements.len() / 2)))
                })
            }
            Self::Branch { sizes, children } => {
                let child = insertion_slot(sizes, index);
                let skipped = offset(sizes, child);
                if let Some(sibling) = Self::insert(&mut children[child], index - skipped, element)
                {
                    children.insert(child + 1, sibling);
                }
                refresh(sizes, children, child);
                Self::split_branch(sizes, children)
            }
        }
    }

    fn split_branch(
        sizes: &mut Vec<usize>,
        children: &mut Vec<ReferenceCounter<Self>>,
    ) -> Option<ReferenceCounter<Self>> {
        if children.len() <= BRANCHING_FACTOR {
            return None;
        }
        let right = children.split_off(children.len() / 2);
        sizes.truncate(children.len());
        Some(ReferenceCounter::new(Self::branch(right)))
    }

    fn remove(slot: &mut ReferenceCounter<Self>, index: usize) -> T {
        match ReferenceCounter::make_mut(slot) {
            Self::Leaf(elements) => elements.remove(index),
            Self::Branch { sizes, children } => {
                let child = insertion_slot(sizes, index);
                let skipped = offset(sizes, child);
                let removed = Self::remove(&mut children[child], index - skipped);
                let first_changed = Self::rebalance(children, child);
                refresh(sizes, children, first_changed);
                removed
            }
        }
    }

    /// Drops an emptied child or merges a thin one into a neighbour.
    ///
    /// Returns the first slot whose size changed.
    fn rebalance(children: &mut Vec<ReferenceCounter<Self>>, child: usize) -> usize {
        let width = children[child].width();
        if width == 0 {
            children.remove(child);
            return child;
        }
        if width >= MERGE_THRESHOLD || children.len() < 2 {
            return child;
        }

        let (left, right) = if child + 1 < children.len() {
            (child, child + 1)
        } else {
            (child - 1, child)
        };
        if children[left].width() + children[right].width() > BRANCHING_FACTOR {
            return child;
        }
        let absorbed = children.remove(right);
        Self::absorb(&mut children[left], absorbed);
        left
    }

    /// Appends the slots of `other`, a node of the same height, to `target`.
    fn absorb(target: &mut ReferenceCounter<Self>, other: ReferenceCounter<Self>) {
        match (
            ReferenceCounter::make_mut(target),
            ReferenceCounter::unwrap_or_clone(other),
        ) {
            (Self::Leaf(elements), Self::Leaf(more)) => elements.extend(more),
            (Self::Branch { sizes, children }, Self::Branch { children: more, .. }) => {
                let from = children.len();
                children.extend(more);
                refresh(sizes, children, from);
            }
            _ => unreachable!("siblings sit at the same height"),
        }
    }

    /// Adds a leaf at the outer edge of a branch of height `height >= 1`.
    fn push_leaf(
        slot: &mut ReferenceCounter<Self>,
        height: usize,
        leaf: ReferenceCounter<Self>,
        side: Side,
    ) -> Option<ReferenceCounter<Self>> {
        let Self::Branch { sizes, children } = ReferenceCounter::make_mut(slot) else {
            unreachable!("leaves sit at height zero");
        };
        let edge = match side {
            Side::Front => 0,
            Side::Back => children.len() - 1,
        };

        if height == 1 {
            match side {
                Side::Front => children.insert(0, leaf),
                Side::Back => children.push(leaf),
            }
        } else if let Some(sibling) = Self::push_leaf(&mut children[edge], height - 1, leaf, side) {
            children.insert(edge + 1, sibling);
        }

        refresh(sizes, children, 0);
        Self::split_branch(sizes, children)
    }

    /// Detaches the outermost leaf of a branch on `side`.
    fn pop_leaf(slot: &mut ReferenceCounter<Self>, side: Side) -> Vec<T> {
        let Self::Branch { sizes, children } = ReferenceCounter::make_mut(slot) else {
            unreachable!("leaves sit at height zero");
        };
        let edge = match side {
            Side::Front => 0,
            Side::Back => children.len() - 1,
        };

        let elements = if matches!(*children[edge], Self::Leaf(_)) {
            ReferenceCounter::unwrap_or_clone(children.remove(edge)).into_elements()
        } else {
            let elements = Self::pop_leaf(&mut children[edge], side);
            if children[edge].width() == 0 {
                children.remove(edge);
            }
            elements
        };

        refresh(sizes, children, 0);
        elements
    }

    fn into_elements(self) -> Vec<T> {
        match self {
            Self::Leaf(elements) => elements,
            Self::Branch { children, .. } => children
                .into_iter()
                .flat_map(|child| ReferenceCounter::unwrap_or_clone(child).into_elements())
                .collect(),
        }
    }

    /// Joins two nodes, `left` before `right`.
    ///
    /// The result sits at the greater of the two heights; a second node of
    /// that height is returned when the join overflowed.
    fn join(
        mut left: ReferenceCounter<Self>,
        left_height: usize,
        mut right: ReferenceCounter<Self>,
        right_height: usize,
    ) -> (ReferenceCounter<Self>, Option<ReferenceCounter<Self>>) {
        match left_height.cmp(&right_height) {
            Ordering::Equal => {
                if left.width() + right.width() <= BRANCHING_FACTOR {
                    Self::absorb(&mut left, right);
                    (left, None)
                } else {
                    (left, Some(right))
                }
            }
            Ordering::Greater => {
                let Self::Branch { sizes, children } = ReferenceCounter::make_mut(&mut left) else {
                    unreachable!("leaves sit at height zero");
                };
                let Some(last) = children.pop() else {
                    unreachable!("branches are never empty");
                };
                let (joined, sibling) = Self::join(last, left_height - 1, right, right_height);
                children.push(joined);
                children.extend(sibling);
                refresh(sizes, children, 0);
                let overflow = Self::split_branch(sizes, children);
                (left, overflow)
            }
            Ordering::Less => {
                let Self::Branch { sizes, children } = ReferenceCounter::make_mut(&mut right) else {
                    unreachable!("leaves sit at height zero");
                };
                let first = children.remove(0);
                let (joined, sibling) = Self::join(left, left_height, first, right_height - 1);
                let front: Vec<_> = std::iter::once(joined).chain(sibling).collect();
                children.splice(0..0, front);
                refresh(sizes, children, 0);
                let overflow = Self::split_branch(sizes, children);
                (right, overflow)
            }
        }
    }
}

// =============================================================================
// Tree
// =============================================================================

/// A non-empty trie and its height (0 when the root is a leaf).
struct Tree<T> {
    root: ReferenceCounter<Node<T>>,
    height: usize,
}

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            height: self.height,
        }
    }
}

impl<T> Tree<T> {
    fn leaf(elements: Vec<T>) -> Self {
        Self {
            root: ReferenceCounter::new(Node::Leaf(elements)),
            height: 0,
        }
    }

    fn len(&self) -> usize {
        self.root.len()
    }

    /// Puts `root` and the overflow sibling of the same height under a new root.
    fn grow(&mut self, sibling: Option<ReferenceCounter<Node<T>>>) {
        if let Some(sibling) = sibling {
            let root = self.root.clone();
            self.root = ReferenceCounter::new(Node::branch(vec![root, sibling]));
            self.height += 1;
        }
    }

    /// Strips single-child roots. Returns `None` for an empty trie.
    fn normalize(mut self) -> Option<Self> {
        loop {
            let child = match &*self.root {
                Node::Leaf(elements) if elements.is_empty() => return None,
                Node::Branch { children, .. } if children.is_empty() => return None,
                Node::Branch { children, .. } if children.len() == 1 => children[0].clone(),
                _ => return Some(self),
            };
            self.root = child;
            self.height -= 1;
        }
    }

    fn from_children(children: Vec<ReferenceCounter<Node<T>>>, height: usize) -> Option<Self> {
        if children.is_empty() {
            return None;
        }
        Self {
            root: ReferenceCounter::new(Node::branch(children)),
            height,
        }
        .normalize()
    }
}

impl<T: Clone> Tree<T> {
    fn insert(&mut self, index: usize, element: T) {
        let sibling = Node::insert(&mut self.root, index, element);
        self.grow(sibling);
    }

    fn push_leaf(&mut self, elements: Vec<T>, side: Side) {
        let leaf = ReferenceCounter::new(Node::Leaf(elements));
        if self.height == 0 {
            let root = self.root.clone();
            let children = match side {
                Side::Front => vec![leaf, root],
                Side::Back => vec![root, leaf],
            };
            self.root = ReferenceCounter::new(Node::branch(children));
            self.height = 1;
        } else {
            let sibling = Node::push_leaf(&mut self.root, self.height, leaf, side);
            self.grow(sibling);
        }
    }

    /// Detaches the outermost leaf on `side`, returning it and what is left.
    fn pop_leaf(mut self, side: Side) -> (Vec<T>, Option<Self>) {
        if self.height == 0 {
            return (ReferenceCounter::unwrap_or_clone(self.root).into_elements(), None);
        }
        let elements = Node::pop_leaf(&mut self.root, side);
        (elements, self.normalize())
    }

    fn join(left: Self, right: Self) -> Self {
        let height = left.height.max(right.height);
        let (root, sibling) = Node::join(left.root, left.height, right.root, right.height);
        let mut tree = Self { root, height };
        tree.grow(sibling);
        tree
    }

    fn concat(left: Option<Self>, right: Option<Self>) -> Option<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self::join(left, right)),
            (left, None) => left,
            (None, right) => right,
        }
    }

    /// Splits into the first `index` elements and the rest.
    fn split(self, index: usize) -> (Option<Self>, Option<Self>) {
        if index == 0 {
            return (None, Some(self));
        }
        if index >= self.len() {
            return (Some(self), None);
        }

        let height = self.height;
        match ReferenceCounter::unwrap_or_clone(self.root) {
            Node::Leaf(mut elements) => {
                let right = elements.split_off(index);
                (Some(Self::leaf(elements)), Some(Self::leaf(right)))
            }
            Node::Branch {
                sizes,
                mut children,
            } => {
                let child = insertion_slot(&sizes, index);
                let skipped = offset(&sizes, child);
                let mut right_children = children.split_off(child);

                if index == skipped {
                    return (
                        Self::from_children(children, height),
                        Self::from_children(right_children, height),
                    );
                }

                let middle = Self {
                    root: right_children.remove(0),
                    height: height - 1,
                };
                let (middle_left, middle_right) = middle.split(index - skipped);
                (
                    Self::concat(Self::from_children(children, height), middle_left),
                    Self::concat(middle_right, Self::from_children(right_children, height)),
                )
            }
        }
    }
}

// =============================================================================
// PersistentVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a size-annotated 32-way trie.
///
/// # Time Complexity
///
/// | Operation          | Complexity          |
/// |--------------------|---------------------|
/// | `new`              | O(1)                |
/// | `get`              | O(log32 N)          |
/// | `update`           | O(log32 N)          |
/// | `push_back`        | O(1) amortized      |
/// | `push_front`       | O(1) amortized      |
/// | `pop_back`         | O(1) amortized      |
/// | `pop_front`        | O(1) amortized      |
/// | `insert`           | O(log32 N)          |
/// | `remove`           | O(log32 N)          |
/// | `split_at`         | O(log N)            |
/// | `append`           | O(log N)            |
/// | `len`              | O(1)                |
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..10).collect();
/// let inserted = vector.insert(5, 100).unwrap();
/// assert_eq!(inserted.get(5), Some(&100));
/// assert_eq!(inserted.get(6), Some(&5));
/// assert_eq!(inserted.len(), 11);
/// ```
#[derive(Clone)]
pub struct PersistentVector<T> {
    head: Buffer<T>,
    tree: Option<Tree<T>>,
    tail: Buffer<T>,
    length: usize,
}

impl<T> PersistentVector<T> {
    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new();
    /// assert!(vector.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: Buffer::new(),
            tree: None,
            tail: Buffer::new(),
            length: 0,
        }
    }

    fn from_parts(head: Buffer<T>, tree: Option<Tree<T>>, tail: Buffer<T>) -> Self {
        let length = head.len() + tree.as_ref().map_or(0, Tree::len) + tail.len();
        Self {
            head,
            tree,
            tail,
            length,
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn tree_len(&self) -> usize {
        self.tree.as_ref().map_or(0, Tree::len)
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// assert_eq!(vector.get(50), Some(&50));
    /// assert_eq!(vector.get(100), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.head.len() {
            return self.head.get(index);
        }
        let index = index - self.head.len();
        let tree_len = self.tree_len();
        if index < tree_len {
            return self.tree.as_ref()?.root.get(index);
        }
        self.tail.get(index - tree_len)
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.length.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns the contiguous run of elements holding `index` and the
    /// position of its first element.
    fn chunk_at(&self, index: usize) -> Option<(&[T], usize)> {
        let head_len = self.head.len();
        if index < head_len {
            return Some((self.head.as_slice(), 0));
        }
        let tree_index = index - head_len;
        let tree_len = self.tree_len();
        if tree_index < tree_len {
            let (leaf, start) = self.tree.as_ref()?.root.leaf_at(tree_index)?;
            return Some((leaf, head_len + start));
        }
        (tree_index - tree_len < self.tail.len())
            .then_some((self.tail.as_slice(), head_len + tree_len))
    }

    /// Returns a double-ended iterator over the elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=3).collect();
    /// let reversed: Vec<&i32> = vector.iter().rev().collect();
    /// assert_eq!(reversed, vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, T> {
        PersistentVectorIterator {
            vector: self,
            front: 0,
            back: self.length,
            front_chunk: [].iter(),
            back_chunk: [].iter(),
        }
    }

    /// Binary searches a vector sorted by `compare`.
    ///
    /// Returns `Ok(index)` of a matching element, or `Err(index)` of the
    /// position where a matching element could be inserted.
    ///
    /// # Complexity
    ///
    /// O(log N * log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).map(|n| n * 2).collect();
    /// assert_eq!(vector.binary_search_by(|element| element.cmp(&40)), Ok(20));
    /// assert_eq!(vector.binary_search_by(|element| element.cmp(&41)), Err(21));
    /// ```
    pub fn binary_search_by<F>(&self, mut compare: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut low = 0;
        let mut high = self.length;
        while low < high {
            let middle = low + (high - low) / 2;
            let Some(element) = self.get(middle) else {
                break;
            };
            match compare(element) {
                Ordering::Less => low = middle + 1,
                Ordering::Greater => high = middle,
                Ordering::Equal => return Ok(middle),
            }
        }
        Err(low)
    }
}

impl<T: Clone> PersistentVector<T> {
    /// Creates a vector containing a single element.
    #[must_use]
    pub fn singleton(element: T) -> Self {
        let mut vector = Self::new();
        vector.push_back_mut(element);
        vector
    }

    /// Creates a vector holding clones of the elements of `slice`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::from_slice(&[1, 2, 3]);
    /// assert_eq!(vector.len(), 3);
    /// ```
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        build_from_vec(slice.to_vec())
    }

    /// Appends an element to the back.
    ///
    /// # Complexity
    ///
    /// O(1) amortized
    #[must_use]
    pub fn push_back(&self, element: T) -> Self {
        let mut vector = self.clone();
        vector.push_back_mut(element);
        vector
    }

    /// Prepends an element to the front.
    ///
    /// # Complexity
    ///
    /// O(1) amortized
    #[must_use]
    pub fn push_front(&self, element: T) -> Self {
        let mut vector = self.clone();
        vector.push_front_mut(element);
        vector
    }

    /// Removes the last element.
    ///
    /// Returns `None` if the vector is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=3).collect();
    /// let (rest, last) = vector.pop_back().unwrap();
    /// assert_eq!(last, 3);
    /// assert_eq!(rest.len(), 2);
    /// ```
    #[must_use]
    pub fn pop_back(&self) -> Option<(Self, T)> {
        let mut vector = self.clone();
        let element = vector.pop_back_mut()?;
        Some((vector, element))
    }

    /// Removes the first element.
    ///
    /// Returns `None` if the vector is empty.
    #[must_use]
    pub fn pop_front(&self) -> Option<(Self, T)> {
        let mut vector = self.clone();
        let element = vector.pop_front_mut()?;
        Some((vector, element))
    }

    /// Replaces the element at `index`.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..5).collect();
    /// let updated = vector.update(2, 100).unwrap();
    /// assert_eq!(updated.get(2), Some(&100));
    /// assert_eq!(vector.get(2), Some(&2));
    /// assert!(vector.update(5, 0).is_none());
    /// ```
    #[must_use]
    pub fn update(&self, index: usize, element: T) -> Option<Self> {
        if index >= self.length {
            return None;
        }
        let mut vector = self.clone();
        vector.set_mut(index, element)?;
        Some(vector)
    }

    /// Inserts `element` at `index`, shifting later elements back.
    ///
    /// Returns `None` if `index > len`.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    #[must_use]
    pub fn insert(&self, index: usize, element: T) -> Option<Self> {
        if index > self.length {
            return None;
        }
        let mut vector = self.clone();
        vector.insert_mut(index, element);
        Some(vector)
    }

    /// Removes the element at `index`, shifting later elements forward.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// let (rest, removed) = vector.remove(40).unwrap();
    /// assert_eq!(removed, 40);
    /// assert_eq!(rest.get(40), Some(&41));
    /// assert_eq!(rest.len(), 99);
    /// ```
    #[must_use]
    pub fn remove(&self, index: usize) -> Option<(Self, T)> {
        if index >= self.length {
            return None;
        }
        let mut vector = self.clone();
        let element = vector.remove_mut(index)?;
        Some((vector, element))
    }

    /// Concatenates two vectors.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let left: PersistentVector<i32> = (0..100).collect();
    /// let right: PersistentVector<i32> = (100..200).collect();
    /// let joined = left.append(&right);
    /// assert_eq!(joined.len(), 200);
    /// assert!(joined.iter().copied().eq(0..200));
    /// ```
    #[must_use]
    pub fn append(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        if other.length <= BRANCHING_FACTOR {
            let mut vector = self.clone();
            for element in other {
                vector.push_back_mut(element.clone());
            }
            return vector;
        }
        if self.length <= BRANCHING_FACTOR {
            let mut vector = other.clone();
            for element in self.iter().rev() {
                vector.push_front_mut(element.clone());
            }
            return vector;
        }

        let mut left = self.clone();
        left.flush_tail();
        let mut right = other.clone();
        right.flush_head();
        let tree = Tree::concat(left.tree, right.tree);
        Self::from_parts(left.head, tree, right.tail)
    }

    /// Splits the vector into the first `index` elements and the rest.
    ///
    /// An index past the end is clamped to the length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..1000).collect();
    /// let (left, right) = vector.split_at(400);
    /// assert_eq!(left.len(), 400);
    /// assert_eq!(right.first(), Some(&400));
    /// ```
    #[must_use]
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        let index = index.min(self.length);
        let head_len = self.head.len();
        let tree_len = self.tree_len();

        if index <= head_len {
            let mut right = self.clone();
            let head: Buffer<T> = right.head.drain(..index).collect();
            right.length -= index;
            (Self::from_parts(head, None, Buffer::new()), right)
        } else if index >= head_len + tree_len {
            let mut left = self.clone();
            let tail: Buffer<T> = left.tail.drain(index - head_len - tree_len..).collect();
            left.length = index;
            (left, Self::from_parts(Buffer::new(), None, tail))
        } else {
            let (tree_left, tree_right) = match self.tree.clone() {
                Some(tree) => tree.split(index - head_len),
                None => (None, None),
            };
            (
                Self::from_parts(self.head.clone(), tree_left, Buffer::new()),
                Self::from_parts(Buffer::new(), tree_right, self.tail.clone()),
            )
        }
    }

    /// Returns the elements in `start..end`, clamped to the vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..10).collect();
    /// let slice = vector.slice(2, 5);
    /// assert!(slice.iter().copied().eq(2..5));
    /// assert!(vector.slice(8, 100).iter().copied().eq(8..10));
    /// ```
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.length);
        let start = start.min(end);
        let (prefix, _) = self.split_at(end);
        prefix.split_at(start).1
    }

    /// Converts this persistent vector into a transient vector.
    ///
    /// # Complexity
    ///
    /// O(1) - only moves fields
    #[must_use]
    pub fn transient(self) -> TransientVector<T> {
        TransientVector {
            vector: self,
            owner: Owner::mint(),
            modifications: 0,
            _marker: PhantomData,
        }
    }

    // -------------------------------------------------------------------------
    // In-place edits shared by the persistent and transient surfaces
    // -------------------------------------------------------------------------

    fn push_leaf(&mut self, elements: Vec<T>, side: Side) {
        if let Some(tree) = self.tree.as_mut() {
            tree.push_leaf(elements, side);
        } else {
            self.tree = Some(Tree::leaf(elements));
        }
    }

    fn flush_head(&mut self) {
        if !self.head.is_empty() {
            let elements: Vec<T> = self.head.drain(..).collect();
            self.push_leaf(elements, Side::Front);
        }
    }

    fn flush_tail(&mut self) {
        if !self.tail.is_empty() {
            let elements: Vec<T> = self.tail.drain(..).collect();
            self.push_leaf(elements, Side::Back);
        }
    }

    pub(crate) fn push_back_mut(&mut self, element: T) {
        if self.tail.is_full() {
            self.flush_tail();
        }
        self.tail.push(element);
        self.length += 1;
    }

    pub(crate) fn push_front_mut(&mut self, element: T) {
        if self.head.is_full() {
            self.flush_head();
        }
        self.head.insert(0, element);
        self.length += 1;
    }

    pub(crate) fn pop_back_mut(&mut self) -> Option<T> {
        if self.tail.is_empty()
            && let Some(tree) = self.tree.take()
        {
            let (elements, rest) = tree.pop_leaf(Side::Back);
            self.tree = rest;
            self.tail.extend(elements);
        }
        let element = self.tail.pop().or_else(|| self.head.pop())?;
        self.length -= 1;
        Some(element)
    }

    pub(crate) fn pop_front_mut(&mut self) -> Option<T> {
        if self.head.is_empty()
            && let Some(tree) = self.tree.take()
        {
            let (elements, rest) = tree.pop_leaf(Side::Front);
            self.tree = rest;
            self.head.extend(elements);
        }
        let element = self.head.pop_at(0).or_else(|| self.tail.pop_at(0))?;
        self.length -= 1;
        Some(element)
    }

    /// Replaces the element at `index`, returning the previous one.
    pub(crate) fn set_mut(&mut self, index: usize, element: T) -> Option<T> {
        let head_len = self.head.len();
        if index < head_len {
            return Some(std::mem::replace(&mut self.head[index], element));
        }
        let index = index - head_len;
        let tree_len = self.tree_len();
        if index < tree_len {
            return self
                .tree
                .as_mut()
                .map(|tree| Node::set(&mut tree.root, index, element));
        }
        self.tail
            .get_mut(index - tree_len)
            .map(|slot| std::mem::replace(slot, element))
    }

    /// Inserts at `index`. Returns `false` when `index > len`.
    pub(crate) fn insert_mut(&mut self, index: usize, element: T) -> bool {
        if index > self.length {
            return false;
        }
        if index == self.length {
            self.push_back_mut(element);
            return true;
        }

        let head_len = self.head.len();
        let tree_len = self.tree_len();
        if index <= head_len && !self.head.is_full() {
            self.head.insert(index, element);
        } else if index >= head_len + tree_len && !self.tail.is_full() {
            self.tail.insert(index - head_len - tree_len, element);
        } else {
            if index < head_len {
                self.flush_head();
            } else if index > head_len + tree_len {
                self.flush_tail();
            }
            let tree_index = index - self.head.len();
            if let Some(tree) = self.tree.as_mut() {
                tree.insert(tree_index, element);
            } else {
                self.tree = Some(Tree::leaf(vec![element]));
            }
        }
        self.length += 1;
        true
    }

    /// Removes the element at `index`.
    pub(crate) fn remove_mut(&mut self, index: usize) -> Option<T> {
        if index >= self.length {
            return None;
        }

        let head_len = self.head.len();
        let tree_len = self.tree_len();
        let removed = if index < head_len {
            self.head.pop_at(index)?
        } else if index - head_len < tree_len {
            let mut tree = self.tree.take()?;
            let removed = Node::remove(&mut tree.root, index - head_len);
            self.tree = tree.normalize();
            removed
        } else {
            self.tail.pop_at(index - head_len - tree_len)?
        };
        self.length -= 1;
        Some(removed)
    }
}

// =============================================================================
// TransientVector Definition
// =============================================================================

/// A transient (temporarily mutable) vector for efficient batch updates.
///
/// The builder edits every node it owns exclusively in place. It counts its
/// structural modifications so that a [`VectorCursor`] created from it can
/// detect edits made behind its back.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::TransientVector;
///
/// let mut transient = TransientVector::new();
/// for element in 0..100 {
///     transient.push_back(element);
/// }
/// transient.insert(50, -1);
/// assert_eq!(transient.remove(0), Some(0));
///
/// let vector = transient.persistent();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(49), Some(&-1));
/// ```
pub struct TransientVector<T> {
    vector: PersistentVector<T>,
    owner: Owner,
    modifications: u64,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientVector<i32>: Send, Sync);
static_assertions::assert_not_impl_any!(TransientVector<String>: Send, Sync);

impl<T> TransientVector<T> {
    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.vector.len()
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Returns the owner token of this editing session.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    pub(crate) const fn modification_count(&self) -> u64 {
        self.modifications
    }

    /// Returns a reference to the element at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.vector.get(index)
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.vector.first()
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.vector.last()
    }

    /// Returns a double-ended iterator over the elements.
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, T> {
        self.vector.iter()
    }

    /// Returns a fail-fast cursor positioned before the first element.
    #[must_use]
    pub const fn cursor(&self) -> VectorCursor {
        VectorCursor::new(self.owner, self.modifications)
    }

    /// Freezes this builder into a persistent vector.
    ///
    /// # Complexity
    ///
    /// O(1) - only moves fields
    #[must_use]
    pub fn persistent(self) -> PersistentVector<T> {
        self.vector
    }
}

impl<T: Clone> TransientVector<T> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        PersistentVector::new().transient()
    }

    /// Appends an element to the back.
    pub fn push_back(&mut self, element: T) {
        self.vector.push_back_mut(element);
        self.modifications += 1;
    }

    /// Prepends an element to the front.
    pub fn push_front(&mut self, element: T) {
        self.vector.push_front_mut(element);
        self.modifications += 1;
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        let element = self.vector.pop_back_mut()?;
        self.modifications += 1;
        Some(element)
    }

    /// Removes and returns the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        let element = self.vector.pop_front_mut()?;
        self.modifications += 1;
        Some(element)
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// Replacing an element is not a structural modification.
    pub fn set(&mut self, index: usize, element: T) -> Option<T> {
        if index >= self.vector.len() {
            return None;
        }
        self.vector.set_mut(index, element)
    }

    /// Inserts `element` at `index`. Returns `false`, dropping the element,
    /// when `index > len`.
    pub fn insert(&mut self, index: usize, element: T) -> bool {
        let inserted = self.vector.insert_mut(index, element);
        if inserted {
            self.modifications += 1;
        }
        inserted
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let element = self.vector.remove_mut(index)?;
        self.modifications += 1;
        Some(element)
    }

    /// Appends every element produced by `elements`.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        for element in elements {
            self.push_back(element);
        }
    }
}

impl<T: Clone> Clone for TransientVector<T> {
    /// Forks the builder. The fork gets a fresh owner.
    fn clone(&self) -> Self {
        let owner = Owner::mint();
        log::trace!(
            "forking transient vector {} into {}",
            self.owner.id(),
            owner.id()
        );
        Self {
            vector: self.vector.clone(),
            owner,
            modifications: 0,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone> Default for TransientVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for TransientVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// BoundedVector Definition
// =============================================================================

/// A persistent vector that never grows beyond a fixed capacity.
///
/// Every growing operation returns [`CapacityError`] instead of exceeding the
/// capacity, and the vector it was applied to is left untouched.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::BoundedVector;
///
/// let mut vector = BoundedVector::new(4);
/// for element in 0..4 {
///     vector = vector.try_push_back(element).unwrap();
/// }
/// let error = vector.try_push_back(4).unwrap_err();
/// assert_eq!(error.capacity, 4);
/// assert_eq!(vector.len(), 4);
/// ```
#[derive(Clone)]
pub struct BoundedVector<T> {
    vector: PersistentVector<T>,
    capacity: usize,
}

impl<T> BoundedVector<T> {
    /// Creates an empty vector bounded to `capacity` elements.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            vector: PersistentVector::new(),
            capacity,
        }
    }

    /// Wraps `vector`, failing if it already exceeds `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `vector.len() > capacity`.
    pub fn from_vector(vector: PersistentVector<T>, capacity: usize) -> Result<Self, CapacityError> {
        if vector.len() > capacity {
            return Err(CapacityError::new(capacity));
        }
        Ok(Self { vector, capacity })
    }

    /// Returns the maximum number of elements.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.vector.len()
    }

    /// Returns `true` if the vector contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Returns `true` if the vector holds `capacity` elements.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.vector.len() >= self.capacity
    }

    /// Returns a reference to the element at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.vector.get(index)
    }

    /// Returns a double-ended iterator over the elements.
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, T> {
        self.vector.iter()
    }

    /// Returns the underlying vector.
    #[must_use]
    pub const fn as_vector(&self) -> &PersistentVector<T> {
        &self.vector
    }

    /// Unwraps the underlying vector.
    #[must_use]
    pub fn into_vector(self) -> PersistentVector<T> {
        self.vector
    }

    fn ensure_room(&self, additional: usize) -> Result<(), CapacityError> {
        if self.vector.len().saturating_add(additional) > self.capacity {
            log::debug!(
                "bounded vector rejected growth by {additional} beyond capacity {}",
                self.capacity
            );
            return Err(CapacityError::new(self.capacity));
        }
        Ok(())
    }

    fn with_vector(&self, vector: PersistentVector<T>) -> Self {
        Self {
            vector,
            capacity: self.capacity,
        }
    }
}

impl<T: Clone> BoundedVector<T> {
    /// Appends an element to the back.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if the vector is full.
    pub fn try_push_back(&self, element: T) -> Result<Self, CapacityError> {
        self.ensure_room(1)?;
        Ok(self.with_vector(self.vector.push_back(element)))
    }

    /// Prepends an element to the front.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if the vector is full.
    pub fn try_push_front(&self, element: T) -> Result<Self, CapacityError> {
        self.ensure_room(1)?;
        Ok(self.with_vector(self.vector.push_front(element)))
    }

    /// Inserts `element` at `index`.
    ///
    /// Returns `Ok(None)` if `index > len`.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if the vector is full.
    pub fn try_insert(&self, index: usize, element: T) -> Result<Option<Self>, CapacityError> {
        self.ensure_room(1)?;
        Ok(self
            .vector
            .insert(index, element)
            .map(|vector| self.with_vector(vector)))
    }

    /// Concatenates `other` after this vector.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if the result would exceed the capacity.
    pub fn try_append(&self, other: &PersistentVector<T>) -> Result<Self, CapacityError> {
        self.ensure_room(other.len())?;
        Ok(self.with_vector(self.vector.append(other)))
    }

    /// Replaces the element at `index`.
    #[must_use]
    pub fn update(&self, index: usize, element: T) -> Option<Self> {
        self.vector
            .update(index, element)
            .map(|vector| self.with_vector(vector))
    }

    /// Removes the element at `index`.
    #[must_use]
    pub fn remove(&self, index: usize) -> Option<(Self, T)> {
        let (vector, element) = self.vector.remove(index)?;
        Some((self.with_vector(vector), element))
    }

    /// Removes the last element.
    #[must_use]
    pub fn pop_back(&self) -> Option<(Self, T)> {
        let (vector, element) = self.vector.pop_back()?;
        Some((self.with_vector(vector), element))
    }

    /// Removes the first element.
    #[must_use]
    pub fn pop_front(&self) -> Option<(Self, T)> {
        let (vector, element) = self.vector.pop_front()?;
        Some((self.with_vector(vector), element))
    }
}

impl<T: PartialEq> PartialEq for BoundedVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity && self.vector == other.vector
    }
}

impl<T: fmt::Debug> fmt::Debug for BoundedVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BoundedVector")
            .field("capacity", &self.capacity)
            .field("elements", &self.vector)
            .finish()
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A double-ended iterator over the elements of a [`PersistentVector`].
///
/// The iterator walks one contiguous run of elements at a time, so a full
/// traversal descends the trie once per leaf.
pub struct PersistentVectorIterator<'a, T> {
    vector: &'a PersistentVector<T>,
    front: usize,
    back: usize,
    front_chunk: std::slice::Iter<'a, T>,
    back_chunk: std::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for PersistentVectorIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        if self.front_chunk.len() == 0 {
            let (chunk, start) = self.vector.chunk_at(self.front)?;
            self.front_chunk = chunk[self.front - start..].iter();
        }
        let element = self.front_chunk.next()?;
        self.front += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for PersistentVectorIterator<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        if self.back_chunk.len() == 0 {
            let (chunk, start) = self.vector.chunk_at(self.back - 1)?;
            self.back_chunk = chunk[..self.back - start].iter();
        }
        let element = self.back_chunk.next_back()?;
        self.back -= 1;
        Some(element)
    }
}

impl<T> ExactSizeIterator for PersistentVectorIterator<'_, T> {}

impl<T> FusedIterator for PersistentVectorIterator<'_, T> {}

/// An owning iterator over the elements of a [`PersistentVector`].
///
/// Elements are popped off the vector; nodes shared with other vectors are
/// copied one leaf at a time.
pub struct PersistentVectorIntoIterator<T> {
    vector: PersistentVector<T>,
}

impl<T: Clone> Iterator for PersistentVectorIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.vector.pop_front_mut()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.vector.len(), Some(self.vector.len()))
    }
}

impl<T: Clone> DoubleEndedIterator for PersistentVectorIntoIterator<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.vector.pop_back_mut()
    }
}

impl<T: Clone> ExactSizeIterator for PersistentVectorIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        build_from_vec(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for PersistentVector<T> {
    fn from(elements: Vec<T>) -> Self {
        build_from_vec(elements)
    }
}

impl<T: Clone> From<PersistentVector<T>> for Vec<T> {
    fn from(vector: PersistentVector<T>) -> Self {
        vector.into_iter().collect()
    }
}

impl<T: Clone> IntoIterator for PersistentVector<T> {
    type Item = T;
    type IntoIter = PersistentVectorIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentVectorIntoIterator { vector: self }
    }
}

impl<'a, T> IntoIterator for &'a PersistentVector<T> {
    type Item = &'a T;
    type IntoIter = PersistentVectorIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PersistentVector<T> {}

impl<T: Hash> Hash for PersistentVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the length first to distinguish vectors of different lengths
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

/// Builds a vector bottom-up: full leaves in the trie, the remainder in the tail.
fn build_from_vec<T>(elements: Vec<T>) -> PersistentVector<T> {
    let length = elements.len();
    if length <= BRANCHING_FACTOR {
        return PersistentVector::from_parts(Buffer::new(), None, elements.into_iter().collect());
    }

    let tail_size = match length % BRANCHING_FACTOR {
        0 => BRANCHING_FACTOR,
        remainder => remainder,
    };
    let mut elements = elements;
    let tail: Buffer<T> = elements.split_off(length - tail_size).into_iter().collect();

    let mut level: Vec<ReferenceCounter<Node<T>>> = Vec::new();
    let mut iter = elements.into_iter();
    loop {
        let chunk: Vec<T> = iter.by_ref().take(BRANCHING_FACTOR).collect();
        if chunk.is_empty() {
            break;
        }
        level.push(ReferenceCounter::new(Node::Leaf(chunk)));
    }

    let mut height = 0;
    while level.len() > 1 {
        level = level
            .chunks(BRANCHING_FACTOR)
            .map(|chunk| ReferenceCounter::new(Node::branch(chunk.to_vec())))
            .collect();
        height += 1;
    }

    let tree = level.pop().map(|root| Tree { root, height });
    PersistentVector::from_parts(Buffer::new(), tree, tail)
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentVector<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
struct PersistentVectorVisitor<T> {
    marker: PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentVectorVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = PersistentVector<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = Vec::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(build_from_vec(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentVector<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentVectorVisitor {
            marker: PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Thread Safety Tests (arc feature only)
// =============================================================================
