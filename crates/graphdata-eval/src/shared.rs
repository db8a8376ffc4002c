//! Reference-counted storage for arrays and objects.
//!
//! Arrays and objects have reference semantics: copying a [`Value`] copies
//! the handle, and a write through any handle is seen through all of them.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::object::ObjectMap;
use crate::value::Value;

/// Contents of an array or object.
pub trait Container: Default {
    /// Move every element into `out`, leaving `self` empty.
    fn drain_into(&mut self, out: &mut Vec<Value>);
}

impl Container for Vec<Value> {
    fn drain_into(&mut self, out: &mut Vec<Value>) {
        out.append(self);
    }
}

impl Container for ObjectMap {
    fn drain_into(&mut self, out: &mut Vec<Value>) {
        mem::take(self).drain_values(out);
    }
}

/// A mutable container shared by every value that refers to it.
///
/// While a container is borrowed mutably, further borrows fail instead of
/// panicking; walkers use this to detect that they have come back around a
/// cycle.
pub struct Shared<T: Container>(Rc<RefCell<T>>);

impl<T: Container> Shared<T> {
    pub fn new(contents: T) -> Self {
        Self(Rc::new(RefCell::new(contents)))
    }

    /// Shared access to the contents.
    ///
    /// # Panics
    ///
    /// If the contents are borrowed mutably.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Exclusive access to the contents.
    ///
    /// # Panics
    ///
    /// If the contents are borrowed at all.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Exclusive access, or `None` when the contents are already borrowed.
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        self.0.try_borrow_mut().ok()
    }

    /// Whether both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the container, stable while any handle is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether this is the only handle.
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }
}

impl<T: Container> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Container + PartialEq> PartialEq for Shared<T> {
    /// Structural equality. A pair met again while it is being compared
    /// counts as equal, so cyclic values compare without looping.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.try_borrow_mut(), other.try_borrow_mut()) {
            (Some(left), Some(right)) => *left == *right,
            _ => true,
        }
    }
}

impl<T: Container + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_borrow_mut() {
            Some(contents) => contents.fmt(f),
            None => f.write_str("[Circular]"),
        }
    }
}

impl<T: Container> Drop for Shared<T> {
    /// Tear down uniquely owned nesting with an explicit stack, so long
    /// chains such as `a = [a]` repeated do not overflow on drop.
    fn drop(&mut self) {
        if !self.is_unique() {
            return;
        }
        let mut pending = Vec::new();
        match self.0.try_borrow_mut() {
            Ok(mut contents) => contents.drain_into(&mut pending),
            Err(_) => return,
        }
        while let Some(value) = pending.pop() {
            match &value {
                Value::Array(items) if items.is_unique() => {
                    if let Some(mut items) = items.try_borrow_mut() {
                        items.drain_into(&mut pending);
                    }
                }
                Value::Object(map) if map.is_unique() => {
                    if let Some(mut map) = map.try_borrow_mut() {
                        map.drain_into(&mut pending);
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_contents() {
        let a = Shared::new(vec![Value::Null]);
        let b = a.clone();
        b.borrow_mut().push(Value::Bool(true));
        assert_eq!(a.borrow().len(), 2);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert!(!a.is_unique());
    }

    #[test]
    fn test_structural_equality() {
        let a = Shared::new(vec![Value::Number(1.0)]);
        let b = Shared::new(vec![Value::Number(1.0)]);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        b.borrow_mut().push(Value::Null);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cyclic_debug_terminates() {
        let items = Shared::new(Vec::new());
        items.borrow_mut().push(Value::Array(items.clone()));
        assert_eq!(format!("{items:?}"), "[Array([Circular])]");
        items.borrow_mut().clear();
    }

    #[test]
    fn test_dropping_a_long_chain() {
        let mut value = Value::array(Vec::new());
        for _ in 0..1_000_000 {
            value = Value::array(vec![value]);
        }
        drop(value);
    }
}
