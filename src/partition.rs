#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Splits `items` into at most `batches` non-empty, disjoint batches in input
/// order. All batches but the last hold `len / batches` items (at least one);
/// the last one absorbs the remainder.
pub fn partition<T>(items: Vec<T>, batches: usize) -> Result<Vec<Vec<T>>, PartitionError> {
    if batches == 0 {
        return Err(PartitionError::InvalidArgument("batch count must be positive"));
    }
    if items.is_empty() {
        return Err(PartitionError::InvalidArgument("nothing to partition"));
    }

    let base_size = (items.len() / batches).max(1);
    let mut out: Vec<Vec<T>> = Vec::with_capacity(batches.min(items.len()));
    let mut current = Vec::with_capacity(base_size);

    for item in items {
        if current.len() == base_size && out.len() < batches - 1 {
            out.push(std::mem::replace(&mut current, Vec::with_capacity(base_size)));
        }
        current.push(item);
    }

    if !current.is_empty() {
        out.push(current);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(batches: &[Vec<usize>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    #[test]
    fn covers_input_with_balanced_batches() -> anyhow::Result<()> {
        for len in 1..=40_usize {
            for n in 1..=len {
                let batches = partition((0..len).collect(), n)?;
                assert!(batches.len() <= n, "len={len} n={n}");
                assert!(batches.iter().all(|b| !b.is_empty()), "len={len} n={n}");

                let base = len / n;
                for batch in &batches[..batches.len() - 1] {
                    assert_eq!(batch.len(), base, "len={len} n={n}");
                }

                let flat = batches.concat();
                assert_eq!(flat, (0..len).collect::<Vec<_>>(), "len={len} n={n}");
            }
        }
        Ok(())
    }

    #[test]
    fn remainder_goes_to_last_batch() -> anyhow::Result<()> {
        let batches = partition((0..10).collect(), 3)?;
        assert_eq!(sizes(&batches), vec![3, 3, 4]);
        Ok(())
    }

    #[test]
    fn more_batches_than_items_gives_one_item_each() -> anyhow::Result<()> {
        let batches = partition((0..3).collect(), 8)?;
        assert_eq!(batches, vec![vec![0], vec![1], vec![2]]);

        let batches = partition((0..4).collect(), 4)?;
        assert_eq!(sizes(&batches), vec![1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn three_targets_over_two_workers() -> anyhow::Result<()> {
        let batches = partition(vec!["1", "2", "3"], 2)?;
        assert_eq!(batches, vec![vec!["1"], vec!["2", "3"]]);
        Ok(())
    }

    #[test]
    fn rejects_zero_batches_and_empty_input() {
        assert_eq!(
            partition(vec![1], 0),
            Err(PartitionError::InvalidArgument("batch count must be positive"))
        );
        assert!(matches!(
            partition(Vec::<u8>::new(), 2),
            Err(PartitionError::InvalidArgument(_))
        ));
    }
}
