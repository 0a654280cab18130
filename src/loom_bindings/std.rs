pub mod hint {
    pub use std::hint::spin_loop;
}

pub mod sync {
    pub use std::sync::Arc;

    pub mod atomic {
        pub use std::sync::atomic::{fence, AtomicPtr, AtomicU32, AtomicUsize};
    }
}

pub mod thread {
    #[inline]
    pub fn yield_now() {
        std::thread::yield_now();
    }

    pub use std::thread::{sleep, spawn, JoinHandle};
}
