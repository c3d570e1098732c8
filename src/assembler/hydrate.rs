use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use crate::parser::proto::tx::Tx;
use crate::rpc::ChainRpc;
use log::warn;
use rayon::prelude::*;
use rayon::ThreadPool;

///
/// Outcome of fetching one transaction of a block.
///
#[derive(Debug)]
pub enum Hydration {
    Keep(Tx),
    /// the node lists the txid but cannot serve it
    Skip(String),
    Abort(OpError),
}

impl Hydration {
    ///
    /// Only `NotFound` is skippable: it marks data missing on the node,
    /// every other failure is a node or transport fault.
    ///
    pub fn of(txid: &str, fetched: OpResult<Tx>) -> Hydration {
        match fetched {
            Ok(tx) => Hydration::Keep(tx),
            Err(e) if e.is_not_found() => {
                warn!("rpc: tx {} not found, skipping ({})", txid, e);
                Hydration::Skip(txid.to_string())
            }
            Err(e) => Hydration::Abort(e.join_msg(&format!("txid {}", txid))),
        }
    }
}

pub(super) enum Hydrator {
    Sequential,
    Parallel(ThreadPool),
}

impl Hydrator {
    pub(super) fn parallel(threads: usize) -> OpResult<Hydrator> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("hydrate-{}", i))
            .build()
            .map_err(|e| OpError::new(OpErrorKind::RuntimeError).join_msg(&e.to_string()))?;
        Ok(Hydrator::Parallel(pool))
    }

    ///
    /// Fetch `txids` and return the kept transactions and the skipped
    /// txids, both in `txids` order.
    ///
    pub(super) fn hydrate<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        txids: &[String],
    ) -> OpResult<(Vec<Tx>, Vec<String>)> {
        let mut txs = Vec::with_capacity(txids.len());
        let mut skipped = Vec::new();
        let mut apply = |hydration: Hydration| -> OpResult<()> {
            match hydration {
                Hydration::Keep(tx) => txs.push(tx),
                Hydration::Skip(txid) => skipped.push(txid),
                Hydration::Abort(e) => return Err(e),
            }
            Ok(())
        };
        match self {
            Hydrator::Sequential => {
                for txid in txids {
                    apply(Hydration::of(txid, rpc.get_transaction(txid)))?;
                }
            }
            Hydrator::Parallel(pool) => {
                let fetched: Vec<OpResult<Tx>> = pool.install(|| {
                    txids
                        .par_iter()
                        .map(|txid| rpc.get_transaction(txid))
                        .collect()
                });
                for (txid, result) in txids.iter().zip(fetched) {
                    apply(Hydration::of(txid, result))?;
                }
            }
        }
        Ok((txs, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_rule() {
        let keep = Hydration::of("a", Ok(Tx::default()));
        assert!(matches!(keep, Hydration::Keep(_)));

        let skip = Hydration::of("b", Err(OpError::new(OpErrorKind::NotFound)));
        assert!(matches!(skip, Hydration::Skip(ref id) if id == "b"));

        for kind in vec![
            OpErrorKind::Transport,
            OpErrorKind::Rpc { code: -5 },
            OpErrorKind::Decode {
                offset: 0,
                field: "format",
            },
        ] {
            match Hydration::of("c", Err(OpError::new(kind))) {
                Hydration::Abort(e) => assert_eq!(e.message(), "txid c"),
                other => panic!("expected abort, got {:?}", other),
            }
        }
    }
}
