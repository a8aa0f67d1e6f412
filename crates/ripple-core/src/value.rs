use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A type-erased, cheaply clonable state value.
///
/// The engine never looks inside a `Value`; it only stores, replaces and
/// hands it to observers. Cells are replaced wholesale on every write.
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone out the inner value if it has type `T`.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if both handles point at the same stored value.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_name)
    }
}

/// Shorthand for [`Value::new`].
pub fn value<T: 'static>(v: T) -> Value {
    Value::new(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_matches_stored_type_only() {
        let v = value(7i32);
        assert!(v.is::<i32>());
        assert_eq!(v.get::<i32>(), Some(7));
        assert_eq!(v.get::<i64>(), None);
        assert_eq!(format!("{v:?}"), "Value<i32>");
    }

    #[test]
    fn clones_share_storage() {
        let a = value(String::from("hi"));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&value(String::from("hi"))));
    }
}
