//! Integration tests for the periodic scheduler
//!
//! Timings use generous margins; each test only asserts ordering facts
//! that hold on a loaded machine.

use borsa_scraper::model::JobState;
use borsa_scraper::scheduler::Scheduler;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn counting_task(
    counter: &Arc<AtomicUsize>,
) -> impl Fn() -> std::future::Ready<()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runs_immediately_then_on_interval() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new();
    scheduler
        .register("tick", Duration::from_millis(100), counting_task(&counter))
        .unwrap();

    scheduler.start().unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1, "first run must not wait");

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(counter.load(Ordering::SeqCst) >= 2);

    scheduler.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_run_waits_a_full_interval() {
    let interval = Duration::from_millis(50);
    let runs: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = Scheduler::new();

    let job_runs = Arc::clone(&runs);
    scheduler
        .register("stamp", interval, move || {
            job_runs.lock().unwrap().push(Instant::now());
            std::future::ready(())
        })
        .unwrap();

    scheduler.start().unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(runs.lock().unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(110)).await;
    assert!(runs.lock().unwrap().len() >= 2);

    scheduler.stop().await;

    let runs = runs.lock().unwrap();
    assert!(runs[1].duration_since(runs[0]) >= interval);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_waits_for_in_flight_execution() {
    let finished = Arc::new(AtomicBool::new(false));
    let mut scheduler = Scheduler::new();

    let job_finished = Arc::clone(&finished);
    scheduler
        .register("slow", Duration::from_secs(3600), move || {
            let finished = Arc::clone(&job_finished);
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                finished.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    let started = Instant::now();
    scheduler.start().unwrap();
    scheduler.stop().await;

    assert!(finished.load(Ordering::SeqCst), "execution was cut short");
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(scheduler.jobs()[0].executions(), 1);
    assert_eq!(scheduler.jobs()[0].state(), JobState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_job_does_not_delay_other_jobs() {
    let fast = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new();

    scheduler
        .register("slow", Duration::from_secs(3600), || async {
            tokio::time::sleep(Duration::from_millis(400)).await;
        })
        .unwrap();
    scheduler
        .register("fast", Duration::from_millis(40), counting_task(&fast))
        .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(fast.load(Ordering::SeqCst) >= 3);
    assert_eq!(scheduler.jobs()[0].executions(), 0);

    scheduler.stop().await;
    assert_eq!(scheduler.jobs()[0].executions(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_executions_of_one_job_never_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new();

    let (job_active, job_max) = (Arc::clone(&active), Arc::clone(&max_active));
    scheduler
        .register("overrun", Duration::from_millis(10), move || {
            let active = Arc::clone(&job_active);
            let max_active = Arc::clone(&job_max);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(220)).await;
    scheduler.stop().await;

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    assert!(scheduler.jobs()[0].executions() >= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_execution_starts_after_stop() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new();
    scheduler
        .register("tick", Duration::from_millis(20), counting_task(&counter))
        .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(70)).await;
    scheduler.stop().await;

    let after_stop = counter.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(counter.load(Ordering::SeqCst), after_stop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_all_jobs_report_stopped() {
    let mut scheduler = Scheduler::new();
    for name in ["a", "b", "c"] {
        scheduler
            .register(name, Duration::from_millis(30), || async {})
            .unwrap();
    }

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(scheduler
        .job_states()
        .iter()
        .all(|(_, state)| *state == JobState::Running));

    scheduler.stop().await;

    assert!(scheduler
        .job_states()
        .iter()
        .all(|(_, state)| *state == JobState::Stopped));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_independent_schedulers_stop_independently() {
    let first_count = Arc::new(AtomicUsize::new(0));
    let second_count = Arc::new(AtomicUsize::new(0));

    let mut first = Scheduler::new();
    first
        .register("first", Duration::from_millis(20), counting_task(&first_count))
        .unwrap();
    let mut second = Scheduler::new();
    second
        .register("second", Duration::from_millis(20), counting_task(&second_count))
        .unwrap();

    first.start().unwrap();
    second.start().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    first.stop().await;
    let second_before = second_count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(second_count.load(Ordering::SeqCst) > second_before);
    assert_eq!(second.jobs()[0].state(), JobState::Running);

    second.stop().await;
}
