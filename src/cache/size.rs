//! Byte Size Estimator
//!
//! Estimates the in-memory footprint of cached values for byte-bounded
//! tables. The estimate is the value's inline size plus, recursively, the
//! heap payload it owns:
//!
//! - scalars: `size_of::<T>()` (an `i64` counts 8 bytes)
//! - `String`/`str`: inline size plus `len()` bytes
//! - `Vec<T>`, slices, arrays: inline size plus the estimate of each element
//! - `Option<T>`: `size_of::<Option<T>>()` plus the heap payload of the inner value
//! - `Box<T>`: pointer size plus the estimate of the boxed value
//! - tuples: sum of the element estimates
//!
//! Estimates grow monotonically with content, which is all eviction needs.

use std::mem::size_of;

// == Byte Size ==
/// Estimated memory footprint of a value, in bytes.
pub trait ByteSize {
    fn byte_size(&self) -> usize;
}

macro_rules! scalar_byte_size {
    ($($t:ty),* $(,)?) => {
        $(
            impl ByteSize for $t {
                fn byte_size(&self) -> usize {
                    size_of::<$t>()
                }
            }
        )*
    };
}

scalar_byte_size!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl ByteSize for str {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for String {
    fn byte_size(&self) -> usize {
        size_of::<String>() + self.len()
    }
}

impl<T: ByteSize> ByteSize for [T] {
    fn byte_size(&self) -> usize {
        self.iter().map(ByteSize::byte_size).sum()
    }
}

impl<T: ByteSize, const N: usize> ByteSize for [T; N] {
    fn byte_size(&self) -> usize {
        self.iter().map(ByteSize::byte_size).sum()
    }
}

impl<T: ByteSize> ByteSize for Vec<T> {
    fn byte_size(&self) -> usize {
        size_of::<Vec<T>>() + self.as_slice().byte_size()
    }
}

impl<T: ByteSize> ByteSize for Option<T> {
    fn byte_size(&self) -> usize {
        let inline = size_of::<Option<T>>();
        match self {
            // Inner inline size is already part of the Option's own size.
            Some(inner) => inline + inner.byte_size().saturating_sub(size_of::<T>()),
            None => inline,
        }
    }
}

impl<T: ByteSize + ?Sized> ByteSize for Box<T> {
    fn byte_size(&self) -> usize {
        size_of::<Box<T>>() + (**self).byte_size()
    }
}

macro_rules! tuple_byte_size {
    ($($name:ident),+) => {
        impl<$($name: ByteSize),+> ByteSize for ($($name,)+) {
            #[allow(non_snake_case)]
            fn byte_size(&self) -> usize {
                let ($($name,)+) = self;
                0 $(+ $name.byte_size())+
            }
        }
    };
}

tuple_byte_size!(A);
tuple_byte_size!(A, B);
tuple_byte_size!(A, B, C);
tuple_byte_size!(A, B, C, D);
