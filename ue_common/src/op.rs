/// Implements the arithmetic operator traits for single-field integer newtypes.
///
/// * `binary` - `T op T -> T`
/// * `inplace` - `T op= T`
/// * `unary` - `op T -> T`
/// * `scalar` - `T op i64 -> T`
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(self.0.$impl_fn())
            }
        }
    };

    (scalar $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait<i64> for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: i64) -> Self::Output {
                Self(self.0.$impl_fn(rhs))
            }
        }
    };
}
