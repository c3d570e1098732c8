use crate::coins::CoinSpec;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use ahash::AHashMap;
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

///
/// Network identity of one chain.
///
/// Two parameter sets describe the same network when their `net`
/// magic matches.
///
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub name: String,
    pub net: u32,
    pub pub_key_hash_addr_id: Vec<u8>,
    pub script_hash_addr_id: Vec<u8>,
}

impl fmt::Debug for ChainParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainParams")
            .field("name", &self.name)
            .field("net", &format_args!("{:#010x}", self.net))
            .field("pub_key_hash_addr_id", &self.pub_key_hash_addr_id)
            .field("script_hash_addr_id", &self.script_hash_addr_id)
            .finish()
    }
}

///
/// Process-scoped set of registered chain parameters.
///
/// Create one per process and share it (`Arc<ChainRegistry>`) between
/// adapters. Entries are never removed or replaced: once a network is
/// registered every caller observes the same `Arc<ChainParams>`.
///
pub struct ChainRegistry {
    params: Mutex<AHashMap<u32, Arc<ChainParams>>>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRegistry {
    pub fn new() -> Self {
        ChainRegistry {
            params: Mutex::new(AHashMap::new()),
        }
    }

    ///
    /// Register `params`.
    ///
    /// Registering identical parameters again is a no-op returning the
    /// stored instance. Registering different parameters under an
    /// already registered network magic is a `Configuration` error.
    ///
    pub fn register(&self, params: ChainParams) -> OpResult<Arc<ChainParams>> {
        let mut registered = self.lock()?;
        if let Some(existing) = registered.get(&params.net) {
            return if **existing == params {
                Ok(existing.clone())
            } else {
                Err(OpError::new(OpErrorKind::Configuration).join_msg(&format!(
                    "network {:#010x} already registered as {}, refusing {}",
                    params.net, existing.name, params.name
                )))
            };
        }
        info!("registered chain params {} ({:#010x})", params.name, params.net);
        let params = Arc::new(params);
        registered.insert(params.net, params.clone());
        Ok(params)
    }

    pub fn is_registered(&self, params: &ChainParams) -> bool {
        match self.lock() {
            Ok(registered) => registered.get(&params.net).map_or(false, |p| **p == *params),
            Err(_) => false,
        }
    }

    pub fn get(&self, net: u32) -> Option<Arc<ChainParams>> {
        self.lock().ok()?.get(&net).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    ///
    /// Parameters of `coin` for the chain name reported by its node,
    /// registering the coin's defaults on first use.
    ///
    /// The supported coins only run a main network, so every chain name
    /// resolves to the main network parameters.
    ///
    pub fn lookup(&self, coin: &CoinSpec, chain: &str) -> OpResult<Arc<ChainParams>> {
        if chain != "main" {
            warn!(
                "{}: node reports chain {:?}, using main network parameters",
                coin.name, chain
            );
        }
        self.register(coin.main_params())
    }

    fn lock(&self) -> OpResult<std::sync::MutexGuard<'_, AHashMap<u32, Arc<ChainParams>>>> {
        self.params.lock().map_err(|_| {
            OpError::new(OpErrorKind::Configuration).join_msg("chain registry lock poisoned")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::{HARCOMIA, SCRYPTA};
    use std::thread;

    fn params(name: &str, net: u32, p2pkh: u8) -> ChainParams {
        ChainParams {
            name: name.to_string(),
            net,
            pub_key_hash_addr_id: vec![p2pkh],
            script_hash_addr_id: vec![5],
        }
    }

    #[test]
    fn test_register_twice_is_idempotent() {
        let registry = ChainRegistry::new();
        let first = registry.register(params("a", 1, 0)).unwrap();
        let second = registry.register(params("a", 1, 0)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered(&params("a", 1, 0)));
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let registry = ChainRegistry::new();
        registry.register(params("a", 1, 0)).unwrap();
        for _ in 0..2 {
            let err = registry.register(params("b", 1, 9)).unwrap_err();
            assert!(matches!(err.kind(), OpErrorKind::Configuration));
        }
        assert_eq!(registry.get(1).unwrap().name, "a");
        assert!(!registry.is_registered(&params("b", 1, 9)));
    }

    #[test]
    fn test_lookup_registers_defaults_once() {
        let registry = ChainRegistry::new();
        assert!(registry.is_empty());
        let main = registry.lookup(&SCRYPTA, "main").unwrap();
        let other = registry.lookup(&SCRYPTA, "test").unwrap();
        assert!(Arc::ptr_eq(&main, &other));
        assert_eq!(main.net, 0xe92caf4c);
        assert_eq!(registry.len(), 1);

        registry.lookup(&HARCOMIA, "main").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_first_lookup() {
        let registry = Arc::new(ChainRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.lookup(&SCRYPTA, "main").unwrap())
            })
            .collect();
        let results: Vec<Arc<ChainParams>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results {
            assert!(Arc::ptr_eq(r, &results[0]));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_debug_shows_hex_magic() {
        let p = params("a", 0xe92caf4c, 48);
        assert!(format!("{:?}", p).contains("0xe92caf4c"));
    }
}
