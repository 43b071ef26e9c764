/// Task sequence numbers
///
/// Every created task gets a human-readable number from a single global
/// counter. Allocation is one atomic increment-and-read:
///
/// ```sql
/// INSERT INTO sequence_counters (name, value) VALUES ('taskNumber', 1)
/// ON CONFLICT (name) DO UPDATE SET value = sequence_counters.value + 1
/// RETURNING value;
/// ```
///
/// The row lock taken by the upsert serializes concurrent callers across
/// every service instance, so two allocations never return the same value.
///
/// Allocation and the task insert are not one transaction. A creation that
/// fails after allocating leaves a hole in the numbering; numbers are unique
/// but not guaranteed contiguous, and holes are never reclaimed.

use crate::store::StoreError;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::atomic::{AtomicI64, Ordering};

/// Name of the counter row used for task numbers
pub const TASK_NUMBER_COUNTER: &str = "taskNumber";

/// Hands out strictly increasing integers
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Returns the next value, never one returned before
    async fn next_value(&self) -> Result<i64, StoreError>;
}

/// Counter row in PostgreSQL
#[derive(Clone)]
pub struct PgSequenceAllocator {
    pool: PgPool,
    name: &'static str,
}

impl PgSequenceAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            name: TASK_NUMBER_COUNTER,
        }
    }
}

#[async_trait]
impl SequenceAllocator for PgSequenceAllocator {
    async fn next_value(&self) -> Result<i64, StoreError> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (name, value)
            VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET value = sequence_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(self.name)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(counter = self.name, value, "Allocated sequence value");
        Ok(value)
    }
}

/// Process-local counter
#[derive(Debug, Default)]
pub struct InMemorySequence {
    value: AtomicI64,
}

impl InMemorySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts allocation after `value`
    pub fn starting_after(value: i64) -> Self {
        Self {
            value: AtomicI64::new(value),
        }
    }
}

#[async_trait]
impl SequenceAllocator for InMemorySequence {
    async fn next_value(&self) -> Result<i64, StoreError> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_in_memory_sequence_starts_at_one() {
        let seq = InMemorySequence::new();
        assert_eq!(seq.next_value().await.unwrap(), 1);
        assert_eq!(seq.next_value().await.unwrap(), 2);

        let seq = InMemorySequence::starting_after(41);
        assert_eq!(seq.next_value().await.unwrap(), 42);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_concurrent_allocations_are_distinct(callers in 1usize..64, workers in 1usize..8) {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(workers)
                .build()
                .unwrap();

            let values = runtime.block_on(async {
                let seq = Arc::new(InMemorySequence::new());
                let handles: Vec<_> = (0..callers)
                    .map(|_| {
                        let seq = seq.clone();
                        tokio::spawn(async move { seq.next_value().await.unwrap() })
                    })
                    .collect();
                let mut values = Vec::with_capacity(callers);
                for handle in handles {
                    values.push(handle.await.unwrap());
                }
                values
            });

            let distinct: HashSet<i64> = values.iter().copied().collect();
            prop_assert_eq!(distinct.len(), callers);
            prop_assert_eq!(distinct.iter().copied().min(), Some(1));
            prop_assert_eq!(distinct.iter().copied().max(), Some(callers as i64));
        }
    }
}
