//! Doubly linked list shared by every index in the cache.
//!
//! Nodes are heap allocated and never move, so a `*mut Node<T>` handed out by
//! [`List::push_front`] stays valid until the node is removed. Nodes can be
//! detached from one list and attached to another without reallocating, which
//! is what makes frequency promotion O(1).

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

/// A node in the doubly linked list.
///
/// Contains a value and pointers to the previous and next nodes.
pub(crate) struct Node<T> {
    /// The value stored in this node. Uses MaybeUninit to allow for sigil nodes.
    val: mem::MaybeUninit<T>,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a sentinel node without initializing the value.
    fn new_sigil() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Returns a reference to the stored value.
    ///
    /// # Safety
    ///
    /// Must not be called on a sigil node.
    pub(crate) unsafe fn value(&self) -> &T {
        // SAFETY: caller guarantees this is not a sigil, so `val` is initialized
        unsafe { self.val.assume_init_ref() }
    }

    /// Returns a mutable reference to the stored value.
    ///
    /// # Safety
    ///
    /// Must not be called on a sigil node.
    pub(crate) unsafe fn value_mut(&mut self) -> &mut T {
        // SAFETY: caller guarantees this is not a sigil, so `val` is initialized
        unsafe { self.val.assume_init_mut() }
    }

    /// Frees a detached node and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must come from [`List::push_front`], must already be detached
    /// from every list, and must not be used afterwards.
    pub(crate) unsafe fn reclaim(node: *mut Node<T>) -> T {
        // SAFETY: the node was allocated through Box and is no longer linked;
        // the value is read out exactly once before the box is freed
        unsafe {
            let boxed = Box::from_raw(node);
            boxed.val.assume_init_read()
        }
    }
}

/// A doubly linked list with O(1) front insertion, back removal, arbitrary
/// unlinking and move-to-front.
///
/// The list uses sentinel nodes (sigils) at the head and tail, so every real
/// node always has non-null neighbours. Front is the most recently attached
/// node; back is the oldest.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Node<T>,
    tail: *mut Node<T>,
    marker: PhantomData<Box<Node<T>>>,
}

impl<T> List<T> {
    /// Creates an empty list.
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Node::new_sigil()));
        let tail = Box::into_raw(Box::new(Node::new_sigil()));

        // SAFETY: head and tail are newly allocated and valid pointers
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List {
            len: 0,
            head,
            tail,
            marker: PhantomData,
        }
    }

    /// Returns the number of nodes in the list.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list has no nodes.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a value to the front of the list and returns its node.
    pub(crate) fn push_front(&mut self, v: T) -> *mut Node<T> {
        // SAFETY: Box::into_raw never returns null
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Node::new(v)))) };
        // SAFETY: node is newly allocated and not part of any list yet
        unsafe { self.attach(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Returns the node at the back of the list (the oldest), if any.
    pub(crate) fn back_node(&self) -> Option<*mut Node<T>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: tail is valid for the lifetime of the list
        Some(unsafe { (*self.tail).prev })
    }

    /// Returns the value at the back of the list, if any.
    pub(crate) fn back(&self) -> Option<&T> {
        // SAFETY: back_node only returns real (non-sigil) nodes
        self.back_node().map(|node| unsafe { (*node).value() })
    }

    /// Removes the back node and returns its value.
    pub(crate) fn remove_last(&mut self) -> Option<T> {
        let node = self.back_node()?;
        // SAFETY: node is a real node of this list
        Some(unsafe { self.remove(node) })
    }

    /// Unlinks `node` and frees it, returning its value.
    ///
    /// # Safety
    ///
    /// `node` must be a real node currently linked into this list.
    pub(crate) unsafe fn remove(&mut self, node: *mut Node<T>) -> T {
        // SAFETY: caller guarantees node belongs to this list
        unsafe {
            self.detach(node);
            Node::reclaim(node)
        }
    }

    /// Unlinks `node` without freeing it, so it can be attached elsewhere.
    ///
    /// # Safety
    ///
    /// `node` must be a real node currently linked into this list.
    pub(crate) unsafe fn detach(&mut self, node: *mut Node<T>) {
        // SAFETY: caller guarantees node is linked, so its neighbours are valid
        unsafe { self.unlink(node) };
        self.len -= 1;
    }

    /// Attaches a node that was detached from another list to the front of
    /// this one.
    ///
    /// # Safety
    ///
    /// `node` must be a live node that is not linked into any list.
    pub(crate) unsafe fn attach_from_other_list(&mut self, node: *mut Node<T>) {
        // SAFETY: caller guarantees node is valid and unlinked
        unsafe { self.attach(node) };
        self.len += 1;
    }

    /// Moves a node to the front of the list.
    ///
    /// # Safety
    ///
    /// `node` must be a real node currently linked into this list.
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Node<T>) {
        // SAFETY: head is valid and node is linked into this list
        unsafe {
            if (*self.head).next == node {
                return;
            }
            self.unlink(node);
            self.attach(node);
        }
    }

    /// Iterates values from front (newest) to back (oldest).
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: head is valid for the lifetime of the list
            next: unsafe { (*self.head).next },
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// Returns true if `node` is linked into this list.
    #[cfg(test)]
    pub(crate) fn contains_node(&self, node: *mut Node<T>) -> bool {
        // SAFETY: every pointer walked here is a node of this list
        unsafe {
            let mut cursor = (*self.head).next;
            while cursor != self.tail {
                if cursor == node {
                    return true;
                }
                cursor = (*cursor).next;
            }
        }
        false
    }

    /// Removes and drops every value.
    pub(crate) fn clear(&mut self) {
        while self.remove_last().is_some() {}
    }

    /// # Safety
    ///
    /// `node` must be linked, so `prev` and `next` are valid nodes.
    unsafe fn unlink(&mut self, node: *mut Node<T>) {
        // SAFETY: the caller guarantees node is linked into this list
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// # Safety
    ///
    /// `node` must be a valid node that is not linked into any list.
    unsafe fn attach(&mut self, node: *mut Node<T>) {
        // SAFETY: head is valid and the caller guarantees node is unlinked
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: head and tail were allocated in `new` and are freed only here
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("length", &self.len).finish()
    }
}

/// Front-to-back iterator over a [`List`].
pub(crate) struct Iter<'a, T> {
    next: *mut Node<T>,
    remaining: usize,
    marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.next;
        self.remaining -= 1;
        // SAFETY: `remaining` real nodes follow the head, and the list is
        // borrowed for 'a so none of them can be freed meanwhile
        unsafe {
            self.next = (*node).next;
            Some((*node).value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
