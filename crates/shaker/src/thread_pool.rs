use std::sync::OnceLock;

use rayon::{ThreadPool, ThreadPoolBuilder};

static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

fn build_rayon_thread_pool() -> ThreadPool {
    ThreadPoolBuilder::new()
        .thread_name(|i| format!("shaker thread {}", i))
        .build()
        .expect("failed to create rayon thread pool.")
}

/// Runs `op` inside the shared pool, so parallel iterators used by `op`
/// run on its workers.
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    THREAD_POOL.get_or_init(build_rayon_thread_pool).install(op)
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::install;

    #[test]
    fn test_install_runs_on_named_workers() {
        let names = install(|| {
            (0..4)
                .into_par_iter()
                .map(|_| std::thread::current().name().map(|name| name.to_string()))
                .collect::<Vec<_>>()
        });
        assert!(names
            .iter()
            .all(|name| name.as_deref().is_some_and(|name| name.starts_with("shaker thread"))));
    }
}
