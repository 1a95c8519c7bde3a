use core::{cell::Cell, time::Duration};
use std::{
    collections::HashSet,
    rc::Rc,
    sync::{Arc, Mutex},
    thread::scope,
};

use crate::{
    AtomicResolver, ConfigError, EpochConfig, Error, LockResolver, MAX_TIMESTAMP, MonotonicClock,
    SequenceResolver, SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource, WaitStrategy,
    resolver_fn,
};

const EPOCH_MS: u64 = 1_700_000_000_000;

#[derive(Debug)]
struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test moves by hand.
#[derive(Clone, Debug)]
struct SharedMockStepTime {
    clock: Rc<Cell<u64>>,
}

impl SharedMockStepTime {
    fn at(millis: u64) -> Self {
        Self {
            clock: Rc::new(Cell::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.clock.set(millis);
    }
}

impl TimeSource for SharedMockStepTime {
    fn current_millis(&self) -> u64 {
        self.clock.get()
    }
}

/// A clock that replays `values`, one per read, then repeats the last one.
struct ScriptedTime {
    values: Vec<u64>,
    reads: Cell<usize>,
}

impl ScriptedTime {
    fn new(values: Vec<u64>) -> Self {
        Self {
            values,
            reads: Cell::new(0),
        }
    }
}

impl TimeSource for ScriptedTime {
    fn current_millis(&self) -> u64 {
        let i = self.reads.get();
        self.reads.set(i + 1);
        self.values[i.min(self.values.len() - 1)]
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("counter service unavailable")]
struct Unavailable;

fn config(machine_id: u64) -> EpochConfig {
    EpochConfig::new(Duration::from_millis(EPOCH_MS), machine_id)
}

fn generator<T, R>(time: T, resolver: R, machine_id: u64) -> SnowflakeGenerator<SnowflakeId, T, R>
where
    T: TimeSource,
    R: SequenceResolver,
{
    SnowflakeGenerator::try_new(config(machine_id), time, resolver).unwrap()
}

fn try_generator<T: TimeSource>(
    config: EpochConfig,
    time: T,
) -> Result<SnowflakeGenerator<SnowflakeId, T, AtomicResolver>, ConfigError> {
    SnowflakeGenerator::try_new(config, time, AtomicResolver::new())
}

fn run_id_sequence_increments_within_same_tick<R: SequenceResolver>(resolver: R) {
    let generator = generator(MockTime { millis: EPOCH_MS + 42 }, resolver, 0);

    let id1 = generator.try_next_id().unwrap();
    let id2 = generator.try_next_id().unwrap();
    let id3 = generator.try_next_id().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

fn run_generator_handles_rollover<R: SequenceResolver>(resolver: R) {
    // One read at construction, 63 for the IDs that fit in the tick, one more
    // for the call that finds the tick exhausted, then the next tick.
    let mut values = vec![EPOCH_MS + 42; 1 + 63 + 1];
    values.push(EPOCH_MS + 43);
    let generator = generator(ScriptedTime::new(values), resolver, 1);

    for i in 0..63 {
        let id = generator.try_next_id().unwrap();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.machine_id(), 1);
    }

    // Sequence 63 is never issued: the generator moves to the next tick.
    let id = generator.try_next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

fn run_out_of_order_tick_never_duplicates<R: SequenceResolver>(resolver: R) {
    // The second call samples 100 after 101 was already resolved, as a caller
    // preempted between reading the clock and resolving would.
    let time = ScriptedTime::new(vec![
        EPOCH_MS + 101, // construction
        EPOCH_MS + 101,
        EPOCH_MS + 100,
        EPOCH_MS + 101,
    ]);
    let generator = generator(time, resolver, 0);

    let ids: Vec<_> = (0..3).map(|_| generator.try_next_id().unwrap()).collect();
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate id in {ids:?}");

    assert!(ids.iter().all(|id| id.timestamp() == 101));
    let sequences: Vec<_> = ids.iter().map(|id| id.sequence()).collect();
    assert_eq!(sequences, [0, 1, 2]);
}

fn run_backward_clock_waits_to_catch_up<R: SequenceResolver>(resolver: R) {
    let time = ScriptedTime::new(vec![
        EPOCH_MS + 10, // construction
        EPOCH_MS + 10,
        EPOCH_MS + 5,
        EPOCH_MS + 6,
        EPOCH_MS + 7,
        EPOCH_MS + 8,
        EPOCH_MS + 9,
        EPOCH_MS + 10,
    ]);
    let generator = generator(&time, resolver, 0);

    let before = generator.try_next_id().unwrap();
    let after = generator.try_next_id().unwrap();

    assert!(after > before);
    assert_eq!((after.timestamp(), after.sequence()), (10, 1));
    assert_eq!(time.reads.get(), 8);
}

fn run_generator_monotonic<R: SequenceResolver>(resolver: R) {
    const TOTAL_IDS: usize = 64 * 256;

    let generator: SnowflakeGenerator<SnowflakeId, _, _> = SnowflakeGenerator::try_new(
        EpochConfig::default().with_machine_id(1),
        MonotonicClock::default(),
        resolver,
    )
    .unwrap();

    let mut last = generator.try_next_id().unwrap();
    for _ in 1..TOTAL_IDS {
        let id = generator.try_next_id().unwrap();
        assert!(id > last);
        assert_eq!(id.machine_id(), 1);
        if id.timestamp() > last.timestamp() {
            assert_eq!(id.sequence(), 0);
        } else {
            assert_eq!(id.sequence(), last.sequence() + 1);
        }
        last = id;
    }
}

fn run_generator_unique_threaded<R>(resolver: R, wait: WaitStrategy)
where
    R: SequenceResolver + Send + Sync,
{
    const IDS_PER_THREAD: usize = 4096;
    let threads = num_cpus::get().clamp(2, 8);
    let total_ids = threads * IDS_PER_THREAD;

    let generator = Arc::new(
        SnowflakeGenerator::<SnowflakeId, _, _>::try_new(
            EpochConfig::default(),
            SystemClock,
            resolver,
        )
        .unwrap()
        .with_wait_strategy(wait),
    );
    let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(total_ids)));

    scope(|s| {
        for _ in 0..threads {
            let generator = Arc::clone(&generator);
            let seen_ids = Arc::clone(&seen_ids);

            s.spawn(move || {
                let ids: Vec<_> = (0..IDS_PER_THREAD)
                    .map(|_| generator.try_next_id().unwrap())
                    .collect();
                let mut seen = seen_ids.lock().unwrap();
                for id in ids {
                    assert!(seen.insert(id), "duplicate id {id:?}");
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, total_ids, "Expected {total_ids} unique IDs");
}

#[test]
fn generates_zero_then_one_then_next_tick() {
    let clock = SharedMockStepTime::at(EPOCH_MS);
    let generator = generator(clock.clone(), AtomicResolver::new(), 0);

    let first = generator.try_next_id().unwrap();
    assert_eq!(first.to_raw(), 0);

    let second = generator.try_next_id().unwrap();
    assert_eq!(second.to_raw(), 1);

    clock.set(EPOCH_MS + 1);
    let third = generator.try_next_id().unwrap().decode();
    assert_eq!(third.sequence, 0);
    assert_eq!(third.machine_id, 0);
    assert_eq!(third.timestamp, first.timestamp() + 1);
}

#[test]
fn atomic_generator_sequence_test() {
    run_id_sequence_increments_within_same_tick(AtomicResolver::new());
}

#[test]
fn lock_generator_sequence_test() {
    run_id_sequence_increments_within_same_tick(LockResolver::new());
}

#[test]
fn atomic_generator_rollover_test() {
    run_generator_handles_rollover(AtomicResolver::new());
}

#[test]
fn lock_generator_rollover_test() {
    run_generator_handles_rollover(LockResolver::new());
}

#[test]
fn exhausted_resolver_forces_next_tick() {
    let resolver = AtomicResolver::new();
    for _ in 0..62 {
        resolver.resolve(EPOCH_MS + 42).unwrap();
    }

    let time = ScriptedTime::new(vec![
        EPOCH_MS + 42, // construction
        EPOCH_MS + 42, // last free sequence
        EPOCH_MS + 42, // exhausted
        EPOCH_MS + 43,
    ]);
    let generator = generator(time, LockResolver::new(), 0).with_resolver(resolver);

    let last_in_tick = generator.try_next_id().unwrap();
    assert_eq!(last_in_tick.sequence(), 62);

    let next = generator.try_next_id().unwrap();
    assert!(next.timestamp() > last_in_tick.timestamp());
    assert_eq!(next.sequence(), 0);
}

#[test]
fn yield_strategy_also_waits_for_next_tick() {
    let mut values = vec![EPOCH_MS + 7; 1 + 63 + 1 + 5];
    values.push(EPOCH_MS + 8);
    let generator = generator(ScriptedTime::new(values), AtomicResolver::new(), 2)
        .with_wait_strategy(WaitStrategy::Yield);
    assert_eq!(generator.wait_strategy(), WaitStrategy::Yield);

    for _ in 0..63 {
        generator.try_next_id().unwrap();
    }
    let id = generator.try_next_id().unwrap();
    assert_eq!((id.timestamp(), id.sequence()), (8, 0));
}

#[test]
fn atomic_generator_monotonic_clock_sequence_increments() {
    run_generator_monotonic(AtomicResolver::new());
}

#[test]
fn lock_generator_monotonic_clock_sequence_increments() {
    run_generator_monotonic(LockResolver::new());
}

#[test]
fn atomic_generator_threaded_unique() {
    run_generator_unique_threaded(AtomicResolver::new(), WaitStrategy::Spin);
}

#[test]
fn lock_generator_threaded_unique() {
    run_generator_unique_threaded(LockResolver::new(), WaitStrategy::Spin);
}

#[test]
fn atomic_generator_threaded_unique_with_yield() {
    run_generator_unique_threaded(AtomicResolver::new(), WaitStrategy::Yield);
}

#[test]
fn stamps_machine_id() {
    let generator = generator(MockTime { millis: EPOCH_MS }, AtomicResolver::new(), 63);
    let id = generator.try_next_id().unwrap();
    assert_eq!(id.machine_id(), 63);
    assert_eq!(id.to_raw(), 63 << 6);
}

#[test]
fn resolver_error_is_returned_verbatim() {
    let generator = generator(MockTime { millis: EPOCH_MS }, AtomicResolver::new(), 0)
        .with_resolver(resolver_fn(|_| Err(Unavailable)));

    assert_eq!(generator.try_next_id(), Err(Error::Resolver(Unavailable)));
}

#[test]
fn resolver_error_while_waiting_is_returned() {
    let calls = Cell::new(0);
    let resolver = resolver_fn(|_| {
        calls.set(calls.get() + 1);
        if calls.get() == 1 { Ok(63) } else { Err(Unavailable) }
    });
    let time = ScriptedTime::new(vec![EPOCH_MS, EPOCH_MS, EPOCH_MS + 1]);
    let generator = generator(time, resolver, 0);

    assert_eq!(generator.try_next_id(), Err(Error::Resolver(Unavailable)));
    assert_eq!(calls.get(), 2);
}

#[test]
fn next_id_degrades_to_zero() {
    let generator = generator(MockTime { millis: EPOCH_MS + 5 }, AtomicResolver::new(), 4)
        .with_resolver(resolver_fn(|_| Err(Unavailable)));
    assert_eq!(generator.next_id(), SnowflakeId::from_raw(0));
}

#[test]
fn clock_before_epoch_is_exhausted() {
    let clock = SharedMockStepTime::at(EPOCH_MS);
    let generator = generator(clock.clone(), AtomicResolver::new(), 0);

    clock.set(EPOCH_MS - 1);
    assert_eq!(
        generator.try_next_id(),
        Err(Error::EpochExhausted {
            now_ms: EPOCH_MS - 1,
            epoch_ms: EPOCH_MS
        })
    );
    assert_eq!(generator.next_id().to_raw(), 0);
}

#[test]
fn clock_past_max_timestamp_is_exhausted() {
    let clock = SharedMockStepTime::at(EPOCH_MS);
    let generator = generator(clock.clone(), AtomicResolver::new(), 0);

    clock.set(EPOCH_MS + MAX_TIMESTAMP);
    let last = generator.try_next_id().unwrap();
    assert_eq!(last.timestamp(), MAX_TIMESTAMP);

    clock.set(EPOCH_MS + MAX_TIMESTAMP + 1);
    assert_eq!(
        generator.try_next_id(),
        Err(Error::EpochExhausted {
            now_ms: EPOCH_MS + MAX_TIMESTAMP + 1,
            epoch_ms: EPOCH_MS
        })
    );
}

#[test]
fn atomic_generator_out_of_order_tick_test() {
    run_out_of_order_tick_never_duplicates(AtomicResolver::new());
}

#[test]
fn lock_generator_out_of_order_tick_test() {
    run_out_of_order_tick_never_duplicates(LockResolver::new());
}

#[test]
fn atomic_generator_backward_clock_test() {
    run_backward_clock_waits_to_catch_up(AtomicResolver::new());
}

#[test]
fn lock_generator_backward_clock_test() {
    run_backward_clock_waits_to_catch_up(LockResolver::new());
}

#[test]
fn construction_rejects_invalid_config() {
    let time = MockTime { millis: EPOCH_MS };

    let err = try_generator(config(64), &time).unwrap_err();
    assert_eq!(err, ConfigError::MachineIdOutOfRange { machine_id: 64, max: 63 });

    let zero = config(0).with_start_epoch(Duration::ZERO);
    let err = try_generator(zero, &time).unwrap_err();
    assert_eq!(err, ConfigError::ZeroEpoch);

    let future = config(0).with_start_epoch(Duration::from_millis(EPOCH_MS + 1));
    let err = try_generator(future, &time).unwrap_err();
    assert_eq!(
        err,
        ConfigError::EpochInFuture {
            epoch_ms: EPOCH_MS + 1,
            now_ms: EPOCH_MS
        }
    );
}

#[test]
fn default_generator_rejects_future_epoch() {
    let far_future =
        EpochConfig::default().with_start_epoch(Duration::from_millis(u64::MAX / 2));
    assert!(matches!(
        SnowflakeGenerator::new(far_future),
        Err(ConfigError::EpochInFuture { .. })
    ));
}

#[test]
fn reconstructs_generation_time() {
    let generator = generator(MockTime { millis: EPOCH_MS + 1_500 }, AtomicResolver::new(), 0);
    let sid = generator.try_next_id().unwrap().decode();

    assert_eq!(generator.generated_at_millis(&sid), EPOCH_MS + 1_500);
    assert_eq!(
        generator.generated_at(&sid),
        Some(std::time::UNIX_EPOCH + Duration::from_millis(EPOCH_MS + 1_500))
    );
    assert_eq!(generator.config().machine_id(), 0);
}
