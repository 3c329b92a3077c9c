//! Dense, zero-based surrogate keys.
//!
//! Each kind of entity gets its own index type, so that a `RouteIdx` can
//! never be used where a `LocationIdx` is expected.

/// Common behaviour of the index newtypes.
pub trait Idx: Copy + Eq + Ord + std::fmt::Debug {
    fn new(idx: usize) -> Self;

    fn idx(&self) -> usize;
}

macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            idx: u32,
        }

        impl $name {
            pub fn new(idx: usize) -> Self {
                debug_assert!(idx <= u32::MAX as usize);
                Self { idx: idx as u32 }
            }

            pub fn idx(&self) -> usize {
                self.idx as usize
            }
        }

        impl Idx for $name {
            fn new(idx: usize) -> Self {
                $name::new(idx)
            }

            fn idx(&self) -> usize {
                $name::idx(self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.idx)
            }
        }
    };
}

define_idx!(LocationIdx);
define_idx!(RouteIdx);
define_idx!(TransportIdx);
define_idx!(BitfieldIdx);
define_idx!(
    /// Identifies the feed a location was loaded from.
    SourceIdx
);

/// Half-open range `[from, to)` of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdxRange<I> {
    from: I,
    to: I,
}

impl<I: Idx> IdxRange<I> {
    pub fn new(from: I, to: I) -> Self {
        debug_assert!(from <= to);
        Self { from, to }
    }

    pub fn from(&self) -> I {
        self.from
    }

    pub fn to(&self) -> I {
        self.to
    }

    pub fn len(&self) -> usize {
        self.to.idx() - self.from.idx()
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn contains(&self, idx: &I) -> bool {
        self.from <= *idx && *idx < self.to
    }

    /// Position of `idx` inside the range.
    pub fn offset_of(&self, idx: &I) -> usize {
        debug_assert!(self.contains(idx));
        idx.idx() - self.from.idx()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = I> + ExactSizeIterator {
        (self.from.idx()..self.to.idx()).map(I::new)
    }
}
