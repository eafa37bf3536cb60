//! Sets of HTTP methods.
//!
//! A route accepts a [`MethodSet`]: a bit set over the methods a route can
//! be registered for. The set also renders the `Allow` header of a 405
//! response.

use std::fmt;

use http::Method;

/// A set of HTTP methods.
///
/// # Example
///
/// ```rust
/// use fratily_router::MethodSet;
/// use http::Method;
///
/// let set = MethodSet::GET | MethodSet::POST;
/// assert!(set.contains(&Method::GET));
/// assert!(!set.contains(&Method::DELETE));
/// assert_eq!(set.to_string(), "GET, POST");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodSet(u8);

impl MethodSet {
    /// No methods.
    pub const EMPTY: Self = Self(0);
    /// `GET`
    pub const GET: Self = Self(1);
    /// `HEAD`
    pub const HEAD: Self = Self(1 << 1);
    /// `POST`
    pub const POST: Self = Self(1 << 2);
    /// `PUT`
    pub const PUT: Self = Self(1 << 3);
    /// `PATCH`
    pub const PATCH: Self = Self(1 << 4);
    /// `DELETE`
    pub const DELETE: Self = Self(1 << 5);
    /// `OPTIONS`
    pub const OPTIONS: Self = Self(1 << 6);
    /// Every supported method.
    pub const ALL: Self = Self(0b111_1111);

    const TABLE: [(Self, Method); 7] = [
        (Self::GET, Method::GET),
        (Self::HEAD, Method::HEAD),
        (Self::POST, Method::POST),
        (Self::PUT, Method::PUT),
        (Self::PATCH, Method::PATCH),
        (Self::DELETE, Method::DELETE),
        (Self::OPTIONS, Method::OPTIONS),
    ];

    /// Returns the single-method set for `method`, if it is supported.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, m)| m == method)
            .map(|(flag, _)| *flag)
    }

    /// Returns `true` if `method` is in the set.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        Self::from_method(method).is_some_and(|flag| self.0 & flag.0 != 0)
    }

    /// Returns the union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the methods in the set, in canonical order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        Self::TABLE
            .iter()
            .filter(|(flag, _)| self.0 & flag.0 != 0)
            .map(|(_, method)| method.clone())
            .collect()
    }
}

impl std::ops::BitOr for MethodSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for MethodSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl FromIterator<Method> for MethodSet {
    /// Collects methods into a set. Unsupported methods are skipped.
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter()
            .filter_map(|method| Self::from_method(&method))
            .fold(Self::EMPTY, Self::union)
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fratily_core::join_methods(&self.methods()))
    }
}

impl fmt::Debug for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodSet({self})")
    }
}
