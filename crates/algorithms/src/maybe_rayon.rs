//! rayon / sequential compatibility layer.
//!
//! With the `parallel` feature this re-exports rayon's prelude. Without it a
//! sequential stand-in provides `into_par_iter()`, so per-row nearest-centre
//! searches compile unchanged for single-threaded builds. Accumulation into
//! cluster sums always happens sequentially in column order, so both builds
//! produce identical centres.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
