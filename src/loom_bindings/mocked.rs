pub mod hint {
    pub use loom::hint::spin_loop;
}

pub mod sync {
    pub use loom::sync::Arc;

    pub mod atomic {
        pub use loom::sync::atomic::{fence, AtomicPtr, AtomicU32, AtomicUsize};
    }
}

pub mod thread {
    pub use loom::thread::{spawn, yield_now, JoinHandle};

    /// Loom has no notion of time, sleeping is a yield.
    pub fn sleep(_duration: std::time::Duration) {
        loom::thread::yield_now();
    }
}
