use crate::{
    Collect, Discard, Doubler, Error, Pipeline, PipelineConfig, PrimeFilter, Sum, TaskProcessor,
    filter_map, run_pipeline, try_filter_map,
};
use core::{convert::Infallible, time::Duration};
use portable_atomic::{AtomicU32, Ordering};
use std::collections::HashSet;

const PRIMES_TO_30_EXCLUSIVE: [i64; 13] = [2, 3, 4, 5, 7, 9, 11, 13, 17, 19, 23, 25, 29];

/// Marks every task it sees so tests can check each one was processed exactly
/// once.
struct Marking {
    seen: Vec<AtomicU32>,
}

impl Marking {
    fn new(tasks: usize) -> Self {
        Self {
            seen: (0..tasks).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    fn assert_each_seen_once(&self) {
        for (task, count) in self.seen.iter().enumerate() {
            assert_eq!(
                count.load(Ordering::SeqCst),
                1,
                "task {task} processed an unexpected number of times"
            );
        }
    }
}

impl TaskProcessor<usize> for Marking {
    type Output = usize;
    type Error = Infallible;

    fn process(&self, task: usize) -> Result<Option<usize>, Infallible> {
        self.seen[task].fetch_add(1, Ordering::SeqCst);
        // Forward odd tasks only, so both paths are exercised.
        Ok((task % 2 == 1).then_some(task))
    }
}

fn sorted(mut items: Vec<i64>) -> Vec<i64> {
    items.sort_unstable();
    items
}

#[test]
fn sums_primes_with_exclusive_bound() {
    let report = run_pipeline(2_i64..=30, 4, 100, PrimeFilter::new(), Sum::default()).unwrap();

    assert_eq!(report.output, PRIMES_TO_30_EXCLUSIVE.iter().sum::<i64>());
    assert_eq!(report.output, 167);
    assert_eq!(report.stats.submitted, 29);
    assert_eq!(report.stats.processed, 29);
    assert_eq!(report.stats.forwarded, 13);
    assert_eq!(report.stats.dropped, 16);
    assert_eq!(report.stats.received, 13);
}

#[test]
fn forwards_exactly_the_exclusive_bound_primes() {
    let report = run_pipeline(2_i64..=30, 4, 100, PrimeFilter::new(), Collect::new()).unwrap();
    assert_eq!(sorted(report.output), PRIMES_TO_30_EXCLUSIVE);
}

#[test]
fn exact_filter_yields_standard_primes() {
    let report = run_pipeline(2_i64..=30, 4, 100, PrimeFilter::exact(), Collect::new()).unwrap();
    assert_eq!(
        sorted(report.output),
        [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]
    );
}

#[test]
fn doubles_every_job() {
    let report = run_pipeline(
        1_i64..=20,
        5,
        1000,
        Doubler::new(Duration::from_millis(2)),
        Collect::new(),
    )
    .unwrap();

    assert_eq!(report.output.len(), 20);
    assert_eq!(
        sorted(report.output),
        (1..=20).map(|n| n * 2).collect::<Vec<i64>>()
    );
    assert_eq!(report.stats.forwarded, 20);
    assert_eq!(report.stats.dropped, 0);
}

#[test]
fn discard_still_drains_everything() {
    let report = run_pipeline(1_i64..=1000, 5, 1000, Doubler::instant(), Discard::default())
        .unwrap();
    assert_eq!(report.output, 1000);
    assert_eq!(report.stats.received, 1000);
}

#[test]
fn no_tasks_completes_immediately() {
    let report = run_pipeline(
        Vec::<i64>::new(),
        8,
        100,
        PrimeFilter::new(),
        Sum::default(),
    )
    .unwrap();

    assert_eq!(report.output, 0);
    assert_eq!(report.stats, Default::default());
}

#[test]
fn capacity_one_with_more_tasks_than_workers() {
    let report = run_pipeline(0_i64..500, 3, 1, PrimeFilter::exact(), Sum::default()).unwrap();
    let expected: i64 = (0..500)
        .filter(|&n| crate::is_prime(n, crate::DivisorBound::Inclusive))
        .sum();
    assert_eq!(report.output, expected);
    assert_eq!(report.stats.processed, 500);
}

#[test]
fn terminates_for_every_pool_size() {
    for workers in [1, 2, 3, 8, 17, 64] {
        for tasks in [0_usize, 1, 7, 100] {
            let marking = Marking::new(tasks);
            let report = run_pipeline(0..tasks, workers, 4, &marking, Discard::default()).unwrap();

            marking.assert_each_seen_once();
            let stats = report.stats;
            assert_eq!(stats.processed, tasks as u64);
            assert_eq!(stats.forwarded + stats.dropped + stats.failed, tasks as u64);
            assert_eq!(stats.received, stats.forwarded);
            assert_eq!(report.output, (tasks / 2) as u64);
        }
    }
}

#[test]
fn every_task_is_processed_exactly_once() {
    let marking = Marking::new(10_000);
    let report = run_pipeline(0..10_000, num_cpus::get().max(2), 16, &marking, Collect::new())
        .unwrap();

    marking.assert_each_seen_once();
    let forwarded: HashSet<usize> = report.output.into_iter().collect();
    assert_eq!(forwarded.len(), 5_000);
    assert!(forwarded.iter().all(|task| task % 2 == 1));
}

#[test]
fn repeated_runs_agree() {
    let pipeline = Pipeline::new(PipelineConfig::new(8, 100)).unwrap();
    let first = pipeline
        .run(0_i64..10_000, PrimeFilter::new(), Sum::default())
        .unwrap();
    let second = pipeline
        .run(0_i64..10_000, PrimeFilter::new(), Sum::default())
        .unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn rejects_invalid_config_before_running() {
    let marking = Marking::new(4);

    let err = run_pipeline(0..4, 0, 10, &marking, Discard::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));

    let err = run_pipeline(0..4, 2, 0, &marking, Discard::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));

    // Nothing was processed by the rejected runs.
    assert!(
        marking
            .seen
            .iter()
            .all(|count| count.load(Ordering::SeqCst) == 0)
    );
}

#[test]
fn task_failures_do_not_stop_workers() {
    let processor = try_filter_map(|n: i64| {
        if n % 10 == 0 {
            Err(format!("task {n} rejected"))
        } else {
            Ok(Some(n))
        }
    });

    let report = run_pipeline(1_i64..=100, 2, 4, processor, Sum::default()).unwrap();

    let expected: i64 = (1..=100).filter(|n| n % 10 != 0).sum();
    assert_eq!(report.output, expected);
    assert_eq!(report.stats.failed, 10);
    assert_eq!(report.stats.forwarded, 90);
    assert_eq!(report.stats.processed, 100);
}

#[test]
fn panicking_worker_is_reported_without_deadlock() {
    let processor = filter_map(|n: i64| {
        assert!(n != 13, "unlucky task");
        Some(n)
    });

    // Several workers so the pool keeps draining after one of them dies.
    let err = run_pipeline(1_i64..=200, 4, 2, processor, Sum::default()).unwrap_err();
    assert_eq!(err, Error::WorkerPanicked { count: 1 });
}

#[test]
fn panicking_source_is_reported_without_deadlock() {
    let tasks = (0_i64..100).map(|n| {
        assert!(n != 50, "source ran dry");
        n
    });

    let err = run_pipeline(tasks, 4, 8, PrimeFilter::new(), Sum::default()).unwrap_err();
    assert_eq!(err, Error::SourcePanicked { submitted: 50 });
}

#[test]
fn separate_queue_capacities() {
    let pipeline = Pipeline::new(
        PipelineConfig::new(5, 1000)
            .with_job_capacity(1)
            .with_result_capacity(3),
    )
    .unwrap();

    let report = pipeline
        .run(1_i64..=20, Doubler::instant(), Sum::default())
        .unwrap();
    assert_eq!(report.output, (1..=20).map(|n| n * 2).sum::<i64>());
}

#[test]
fn slow_aggregator_applies_backpressure() {
    let pipeline = Pipeline::new(PipelineConfig::new(4, 1)).unwrap();
    let slow_sum = crate::Fold::new(0_i64, |acc: &mut i64, n: i64| {
        std::thread::sleep(Duration::from_micros(200));
        *acc += n;
    });

    let report = pipeline
        .run(1_i64..=200, Doubler::instant(), slow_sum)
        .unwrap();
    assert_eq!(report.output, (1..=200).map(|n| n * 2).sum::<i64>());
}

#[cfg(feature = "async-tokio")]
mod async_tokio {
    use super::*;
    use crate::run_pipeline_async;

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn sums_primes_with_exclusive_bound() {
        let report = run_pipeline_async(2_i64..=30, 4, 100, PrimeFilter::new(), Sum::default())
            .await
            .unwrap();

        assert_eq!(report.output, 167);
        assert_eq!(report.stats.forwarded, 13);
        assert_eq!(report.stats.processed, 29);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn doubles_every_job() {
        let report = run_pipeline_async(
            1_i64..=20,
            5,
            1000,
            Doubler::new(Duration::from_millis(2)),
            Collect::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            sorted(report.output),
            (1..=20).map(|n| n * 2).collect::<Vec<i64>>()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn no_tasks_completes_immediately() {
        let report = run_pipeline_async(
            Vec::<i64>::new(),
            8,
            100,
            PrimeFilter::new(),
            Sum::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.output, 0);
        assert_eq!(report.stats, Default::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_task_is_processed_exactly_once() {
        let marking = std::sync::Arc::new(Marking::new(2_000));
        let report = run_pipeline_async(
            0..2_000,
            7,
            1,
            std::sync::Arc::clone(&marking),
            Discard::default(),
        )
        .await
        .unwrap();

        marking.assert_each_seen_once();
        assert_eq!(report.output, 1_000);
        assert_eq!(report.stats.processed, 2_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn task_failures_do_not_stop_workers() {
        let processor = try_filter_map(|n: i64| {
            if n % 10 == 0 {
                Err(format!("task {n} rejected"))
            } else {
                Ok(Some(n))
            }
        });

        let report = run_pipeline_async(1_i64..=100, 3, 4, processor, Sum::default())
            .await
            .unwrap();
        assert_eq!(report.stats.failed, 10);
        assert_eq!(report.stats.forwarded, 90);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn panicking_worker_is_reported_without_deadlock() {
        let processor = filter_map(|n: i64| {
            assert!(n != 13, "unlucky task");
            Some(n)
        });

        let err = run_pipeline_async(1_i64..=200, 4, 2, processor, Sum::default())
            .await
            .unwrap_err();
        assert_eq!(err, Error::WorkerPanicked { count: 1 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rejects_invalid_config() {
        let err = run_pipeline_async(0_i64..4, 0, 10, PrimeFilter::new(), Sum::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
