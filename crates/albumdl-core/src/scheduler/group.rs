//! Bounded fan-out over blocking request jobs.
//!
//! Keeps up to `max_in_flight` jobs running on the blocking pool; when one
//! finishes, the next queued job is started until the queue is empty. Results
//! are slotted by job index, so callers get input order regardless of the
//! order in which jobs complete.

use std::collections::VecDeque;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::control::AbortFlag;
use crate::http::FetchError;

/// First failure of a strict group, with the index of the job that failed.
#[derive(Debug, Error)]
#[error("item {index}: {source}")]
pub struct GroupError {
    pub index: usize,
    #[source]
    pub source: FetchError,
}

type Slot<T> = (usize, Result<T, FetchError>);

fn spawn_job<T, F>(join_set: &mut JoinSet<Slot<T>>, index: usize, job: F)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, FetchError> + Send + 'static,
{
    join_set.spawn(async move {
        let result = tokio::task::spawn_blocking(job)
            .await
            .unwrap_or_else(|e| Err(FetchError::Worker(e.to_string())));
        (index, result)
    });
}

fn unreported(index: usize) -> FetchError {
    FetchError::Worker(format!("job {} did not report a result", index))
}

/// Runs every job with at most `max_in_flight` at once. The first failure
/// raises the shared abort flag handed to each job, stops queued jobs from
/// starting, and is returned; later results are discarded.
pub async fn run_strict<T, F>(jobs: Vec<F>, max_in_flight: usize) -> Result<Vec<T>, GroupError>
where
    T: Send + 'static,
    F: FnOnce(AbortFlag) -> Result<T, FetchError> + Send + 'static,
{
    let max_in_flight = max_in_flight.max(1);
    let count = jobs.len();
    let abort = AbortFlag::new();
    let mut queue: VecDeque<(usize, F)> = jobs.into_iter().enumerate().collect();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(count).collect();
    let mut join_set = JoinSet::new();

    loop {
        while join_set.len() < max_in_flight {
            let Some((index, job)) = queue.pop_front() else {
                break;
            };
            let abort = abort.clone();
            spawn_job(&mut join_set, index, move || {
                if abort.is_set() {
                    return Err(FetchError::Cancelled);
                }
                job(abort)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let Ok((index, result)) = joined else {
            continue;
        };
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(source) => {
                abort.request();
                join_set.abort_all();
                return Err(GroupError { index, source });
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| GroupError {
                index,
                source: unreported(index),
            })
        })
        .collect()
}

/// Runs every job to completion with at most `max_in_flight` at once; a
/// failure never stops its siblings. `on_complete` is called exactly once per
/// job, in completion order, from this task only.
pub async fn run_tolerant<T, F, C>(
    jobs: Vec<F>,
    max_in_flight: usize,
    mut on_complete: C,
) -> Vec<Result<T, FetchError>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, FetchError> + Send + 'static,
    C: FnMut(usize, &Result<T, FetchError>),
{
    let max_in_flight = max_in_flight.max(1);
    let count = jobs.len();
    let mut queue: VecDeque<(usize, F)> = jobs.into_iter().enumerate().collect();
    let mut slots: Vec<Option<Result<T, FetchError>>> =
        std::iter::repeat_with(|| None).take(count).collect();
    let mut join_set = JoinSet::new();

    loop {
        while join_set.len() < max_in_flight {
            let Some((index, job)) = queue.pop_front() else {
                break;
            };
            spawn_job(&mut join_set, index, job);
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let Ok((index, result)) = joined else {
            continue;
        };
        on_complete(index, &result);
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                let result = Err(unreported(index));
                on_complete(index, &result);
                result
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    type StrictJob = Box<dyn FnOnce(AbortFlag) -> Result<usize, FetchError> + Send>;

    #[tokio::test]
    async fn strict_keeps_input_order_when_completion_is_reversed() {
        let jobs: Vec<StrictJob> = (0..5usize)
            .map(|i| {
                Box::new(move |_abort: AbortFlag| -> Result<usize, FetchError> {
                    std::thread::sleep(Duration::from_millis(10 * (5 - i) as u64));
                    Ok(i)
                }) as StrictJob
            })
            .collect();
        let out = run_strict(jobs, 5).await.unwrap();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn strict_fails_fast_and_signals_siblings() {
        let observed = Arc::new(AtomicUsize::new(0));
        let mut jobs: Vec<StrictJob> = Vec::new();
        for _ in 0..2 {
            let observed = Arc::clone(&observed);
            jobs.push(Box::new(move |abort: AbortFlag| -> Result<usize, FetchError> {
                let start = Instant::now();
                while start.elapsed() < Duration::from_secs(5) {
                    if abort.is_set() {
                        observed.fetch_add(1, Ordering::SeqCst);
                        return Err(FetchError::Cancelled);
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
                Ok(0)
            }));
        }
        jobs.push(Box::new(|_abort: AbortFlag| -> Result<usize, FetchError> {
            Err(FetchError::Http(500))
        }));

        let started = Instant::now();
        let err = run_strict(jobs, 3).await.unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.source.status(), Some(500));
        assert!(started.elapsed() < Duration::from_secs(4));

        let deadline = Instant::now() + Duration::from_secs(2);
        while observed.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(observed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn strict_never_exceeds_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<StrictJob> = (0..12usize)
            .map(|i| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                Box::new(move |_abort: AbortFlag| -> Result<usize, FetchError> {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                }) as StrictJob
            })
            .collect();
        let out = run_strict(jobs, 3).await.unwrap();
        assert_eq!(out.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn strict_empty_group_is_ok() {
        let out = run_strict(Vec::<StrictJob>::new(), 4).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn tolerant_reports_every_job_once() {
        type Job = Box<dyn FnOnce() -> Result<usize, FetchError> + Send>;
        let jobs: Vec<Job> = (0..10usize)
            .map(|i| {
                Box::new(move || -> Result<usize, FetchError> {
                    if i % 3 == 0 {
                        Err(FetchError::Http(404))
                    } else {
                        Ok(i)
                    }
                }) as Job
            })
            .collect();
        let mut seen = Vec::new();
        let out = run_tolerant(jobs, 4, |index, _| seen.push(index)).await;
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert_eq!(out.iter().filter(|r| r.is_err()).count(), 4);
        assert_eq!(out[1].as_ref().ok(), Some(&1));
    }

    #[tokio::test]
    async fn tolerant_turns_panics_into_failures() {
        type Job = Box<dyn FnOnce() -> Result<usize, FetchError> + Send>;
        let jobs: Vec<Job> = vec![
            Box::new(|| -> Result<usize, FetchError> { Ok(1) }) as Job,
            Box::new(|| -> Result<usize, FetchError> { panic!("boom") }) as Job,
        ];
        let mut ticks = 0;
        let out = run_tolerant(jobs, 2, |_, _| ticks += 1).await;
        assert_eq!(ticks, 2);
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(FetchError::Worker(_))));
    }
}
