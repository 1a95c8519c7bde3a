/// How a generator behaves while it waits for the clock to leave an exhausted
/// millisecond.
///
/// Neither strategy sleeps: the wait always ends at the first clock reading
/// that differs from the exhausted one, so worst-case latency stays at
/// slightly more than one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaitStrategy {
    /// Busy-poll the clock with a [`core::hint::spin_loop`] hint between
    /// reads. Lowest latency, burns a core while waiting.
    #[default]
    Spin,
    /// Call [`std::thread::yield_now`] between reads, letting other runnable
    /// threads in at the cost of scheduler latency.
    Yield,
}

impl WaitStrategy {
    /// Pauses once between two clock reads.
    #[inline]
    pub fn relax(self) {
        match self {
            Self::Spin => core::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
        }
    }
}
