//!
//! Integration Test
//!
//! Drive `CoinAdapter` against an in-memory node, counting the RPC calls
//! each request makes.
//!
#[cfg(test)]
mod adapter_tests {
    use coin_adapters::{
        AdapterConfig, BlockBody, BlockHeader, BlockRef, ChainInfo, ChainParams, ChainRegistry,
        ChainRpc, CoinAdapter, Error, ErrorKind, RpcBlock, ScriptPubKey, ScriptSig, ScriptType,
        ToHex, Tx, Verbosity, Vin, Vout,
    };
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SPECIAL_TX_HEIGHT: u32 = 454000;

    /// in-memory node
    #[derive(Default)]
    struct MockRpc {
        chain: Option<String>,
        blocks: HashMap<u32, Vec<String>>,
        missing: HashSet<String>,
        failing_summary: bool,
        masternodes: Option<serde_json::Value>,
        chain_info_calls: AtomicUsize,
        block_hash_calls: AtomicUsize,
        summary_calls: AtomicUsize,
        full_calls: AtomicUsize,
        tx_calls: AtomicUsize,
        generic_calls: AtomicUsize,
    }

    impl MockRpc {
        fn main() -> Self {
            MockRpc {
                chain: Some("main".to_string()),
                ..Default::default()
            }
        }

        fn with_block(mut self, height: u32, txids: &[&str]) -> Self {
            self.blocks
                .insert(height, txids.iter().map(|t| t.to_string()).collect());
            self
        }

        fn count(counter: &AtomicUsize) {
            counter.fetch_add(1, Ordering::SeqCst);
        }

        fn calls(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }

        fn height_of(&self, hash: &str) -> Option<u32> {
            hash.strip_prefix("hash-")?.parse().ok()
        }
    }

    impl ChainRpc for MockRpc {
        fn get_chain_info(&self) -> Result<ChainInfo, Error> {
            MockRpc::count(&self.chain_info_calls);
            match &self.chain {
                Some(chain) => Ok(ChainInfo {
                    chain: chain.clone(),
                    ..Default::default()
                }),
                None => Err(Error::new(ErrorKind::Transport).join_msg("connection refused")),
            }
        }

        fn get_block_hash(&self, height: u32) -> Result<String, Error> {
            MockRpc::count(&self.block_hash_calls);
            if self.blocks.contains_key(&height) {
                Ok(format!("hash-{}", height))
            } else {
                Err(Error::new(ErrorKind::NotFound))
            }
        }

        fn get_block(&self, hash: &str, verbosity: Verbosity) -> Result<RpcBlock, Error> {
            match verbosity {
                Verbosity::Summary => MockRpc::count(&self.summary_calls),
                Verbosity::Full => MockRpc::count(&self.full_calls),
            }
            if self.failing_summary && verbosity == Verbosity::Summary {
                return Err(Error::new(ErrorKind::Transport).join_msg("timeout"));
            }
            let height = self
                .height_of(hash)
                .filter(|h| self.blocks.contains_key(h))
                .ok_or_else(|| Error::new(ErrorKind::NotFound))?;
            let txids = &self.blocks[&height];
            let header = BlockHeader {
                hash: hash.to_string(),
                height,
                time: 1600000000,
                ..Default::default()
            };
            let body = match verbosity {
                Verbosity::Summary => BlockBody::Txids(txids.clone()),
                Verbosity::Full => BlockBody::Transactions(txids.iter().map(|t| tx(t)).collect()),
            };
            Ok(RpcBlock { header, body })
        }

        fn get_transaction(&self, txid: &str) -> Result<Tx, Error> {
            MockRpc::count(&self.tx_calls);
            if self.missing.contains(txid) {
                Err(Error::new(ErrorKind::NotFound))
            } else {
                Ok(tx(txid))
            }
        }

        fn call(
            &self,
            method: &str,
            _params: &[serde_json::Value],
        ) -> Result<serde_json::Value, Error> {
            MockRpc::count(&self.generic_calls);
            match (method, &self.masternodes) {
                ("masternodelist", Some(list)) => Ok(list.clone()),
                _ => Err(Error::new(ErrorKind::Rpc { code: -32601 })),
            }
        }
    }

    fn tx(txid: &str) -> Tx {
        Tx {
            txid: txid.to_string(),
            ..Default::default()
        }
    }

    fn txids(txs: &[Tx]) -> Vec<&str> {
        txs.iter().map(|t| t.txid.as_str()).collect()
    }

    /// utility function
    fn adapter(coin: &str, rpc: MockRpc) -> CoinAdapter<Arc<MockRpc>> {
        let _ = env_logger::builder().is_test(true).try_init();
        let registry = Arc::new(ChainRegistry::new());
        let mut adapter =
            CoinAdapter::new(AdapterConfig::new(coin), Arc::new(rpc), registry).unwrap();
        adapter.initialize().unwrap();
        adapter
    }

    #[test]
    /// a tx the node cannot serve is left out, the block still assembles
    fn test_not_found_transaction_is_skipped() {
        let mut rpc = MockRpc::main().with_block(SPECIAL_TX_HEIGHT + 5, &["a", "b", "c"]);
        rpc.missing.insert("b".to_string());
        let adapter = adapter("scrypta", rpc);

        let hash = format!("hash-{}", SPECIAL_TX_HEIGHT + 5);
        let assembled = adapter
            .get_assembled_block(BlockRef::Hash(hash.clone()))
            .unwrap();
        assert_eq!(txids(&assembled.block.txs), vec!["a", "c"]);
        assert_eq!(assembled.skipped, vec!["b".to_string()]);
        assert_eq!(assembled.block.header.hash, hash);

        let block = adapter.get_block(BlockRef::Hash(hash)).unwrap();
        assert_eq!(txids(&block.txs), vec!["a", "c"]);
    }

    #[test]
    /// below the special tx height one full getblock, no summary, no tx fetches
    fn test_legacy_threshold_routing() {
        let below = SPECIAL_TX_HEIGHT - 1;
        let rpc = MockRpc::main()
            .with_block(below, &["x", "y"])
            .with_block(SPECIAL_TX_HEIGHT, &["p", "q", "r"]);
        let adapter = adapter("scrypta", rpc);
        let rpc = adapter.rpc().clone();

        let block = adapter.get_block(BlockRef::Height(below)).unwrap();
        assert_eq!(txids(&block.txs), vec!["x", "y"]);
        assert_eq!(MockRpc::calls(&rpc.full_calls), 1);
        assert_eq!(MockRpc::calls(&rpc.summary_calls), 0);
        assert_eq!(MockRpc::calls(&rpc.tx_calls), 0);

        let block = adapter.get_block(BlockRef::Height(SPECIAL_TX_HEIGHT)).unwrap();
        assert_eq!(txids(&block.txs), vec!["p", "q", "r"]);
        assert_eq!(MockRpc::calls(&rpc.full_calls), 1);
        assert_eq!(MockRpc::calls(&rpc.summary_calls), 1);
        assert_eq!(MockRpc::calls(&rpc.tx_calls), 3);
    }

    #[test]
    /// a hash below the threshold still goes through the summary
    fn test_hash_request_ignores_threshold() {
        let rpc = MockRpc::main().with_block(10, &["g"]);
        let adapter = adapter("harcomia", rpc);
        let block = adapter.get_block(BlockRef::from("hash-10")).unwrap();
        assert_eq!(txids(&block.txs), vec!["g"]);
        assert_eq!(MockRpc::calls(&adapter.rpc().summary_calls), 1);
        assert_eq!(MockRpc::calls(&adapter.rpc().full_calls), 0);
    }

    #[test]
    /// chains without special transactions always fetch full blocks
    fn test_full_fetch_chains() {
        for coin in &["knoxfs", "xap", "liquid"] {
            let rpc = MockRpc::main().with_block(900000, &["k"]);
            let adapter = adapter(coin, rpc);
            adapter.get_block(BlockRef::Height(900000)).unwrap();
            adapter.get_block(BlockRef::from("hash-900000")).unwrap();
            let rpc = adapter.rpc();
            assert_eq!(MockRpc::calls(&rpc.full_calls), 2, "{}", coin);
            assert_eq!(MockRpc::calls(&rpc.summary_calls), 0, "{}", coin);
            assert_eq!(MockRpc::calls(&rpc.tx_calls), 0, "{}", coin);
        }
    }

    #[test]
    /// transport failure of the summary is returned as is, nothing is hydrated
    fn test_summary_transport_error() {
        let mut rpc = MockRpc::main().with_block(SPECIAL_TX_HEIGHT + 1, &["a", "b"]);
        rpc.failing_summary = true;
        let adapter = adapter("scrypta", rpc);

        let err = adapter
            .get_block(BlockRef::Height(SPECIAL_TX_HEIGHT + 1))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Transport));
        assert_eq!(
            err.message(),
            format!("timeout, hash hash-{}", SPECIAL_TX_HEIGHT + 1)
        );
        assert_eq!(MockRpc::calls(&adapter.rpc().tx_calls), 0);
    }

    #[test]
    fn test_unknown_height_is_not_found() {
        let adapter = adapter("scrypta", MockRpc::main());
        for height in &[1, SPECIAL_TX_HEIGHT + 1] {
            let err = adapter.get_block(BlockRef::Height(*height)).unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(err.message(), format!("height {}", height));
        }
    }

    #[test]
    fn test_parallel_hydration() {
        let ids: Vec<String> = (0..200).map(|i| format!("tx{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut rpc = MockRpc::main().with_block(SPECIAL_TX_HEIGHT, &id_refs);
        rpc.missing.insert("tx13".to_string());
        rpc.missing.insert("tx199".to_string());

        let config = AdapterConfig::from_json(
            r#"{"coin_name": "scrypta", "parallel_hydration": true, "hydration_threads": 8}"#,
        )
        .unwrap();
        let mut adapter =
            CoinAdapter::new(config, rpc, Arc::new(ChainRegistry::new())).unwrap();
        adapter.initialize().unwrap();

        let assembled = adapter
            .get_assembled_block(BlockRef::Height(SPECIAL_TX_HEIGHT))
            .unwrap();
        let expected: Vec<&str> = id_refs
            .iter()
            .copied()
            .filter(|id| *id != "tx13" && *id != "tx199")
            .collect();
        assert_eq!(txids(&assembled.block.txs), expected);
        assert_eq!(assembled.skipped, vec!["tx13".to_string(), "tx199".to_string()]);
        assert_eq!(MockRpc::calls(&adapter.rpc().tx_calls), 200);
    }

    #[test]
    fn test_initialize() {
        let registry = Arc::new(ChainRegistry::new());
        let mut adapter = CoinAdapter::new(
            AdapterConfig::new("Scrypta"),
            MockRpc::main(),
            registry.clone(),
        )
        .unwrap();
        assert!(matches!(
            adapter.params().unwrap_err().kind(),
            ErrorKind::Configuration
        ));
        adapter.initialize().unwrap();
        assert_eq!(adapter.params().unwrap().net, 0xe92caf4c);
        assert_eq!(adapter.network(), "livenet");
        assert!(!adapter.is_testnet());
        assert!(!adapter.supports_estimate_smart_fee());
        assert_eq!(MockRpc::calls(&adapter.rpc().chain_info_calls), 1);

        // a second adapter of the same coin shares the registered params
        let mut other =
            CoinAdapter::new(AdapterConfig::new("lyra"), MockRpc::main(), registry.clone())
                .unwrap();
        other.initialize().unwrap();
        assert!(Arc::ptr_eq(
            adapter.params().unwrap(),
            other.params().unwrap()
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_initialize_fails_fast() {
        // node down
        let mut adapter = CoinAdapter::new(
            AdapterConfig::new("harcomia"),
            MockRpc::default(),
            Arc::new(ChainRegistry::new()),
        )
        .unwrap();
        let err = adapter.initialize().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Transport));
        assert!(adapter.params().is_err());

        // another chain already owns the network magic
        let registry = Arc::new(ChainRegistry::new());
        registry
            .register(ChainParams {
                name: "Impostor".to_string(),
                net: 0x0c01acc1,
                pub_key_hash_addr_id: vec![0],
                script_hash_addr_id: vec![5],
            })
            .unwrap();
        let mut adapter =
            CoinAdapter::new(AdapterConfig::new("harcomia"), MockRpc::main(), registry).unwrap();
        let err = adapter.initialize().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration));
        assert!(adapter.params().is_err());
    }

    #[test]
    fn test_unknown_coin() {
        let result = CoinAdapter::new(
            AdapterConfig::new("dogecoin"),
            MockRpc::main(),
            Arc::new(ChainRegistry::new()),
        );
        match result {
            Err(e) => assert!(matches!(e.kind(), ErrorKind::Configuration)),
            Ok(_) => panic!("dogecoin is not supported"),
        }
    }

    #[test]
    fn test_mempool_transaction() {
        let mut rpc = MockRpc::main();
        rpc.missing.insert("gone".to_string());
        let adapter = adapter("xap", rpc);
        assert_eq!(adapter.get_transaction_for_mempool("here").unwrap().txid, "here");
        let err = adapter.get_transaction_for_mempool("gone").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "txid gone");
    }

    #[test]
    fn test_masternode_list() {
        let mut rpc = MockRpc::main();
        rpc.masternodes = Some(serde_json::json!({"COutPoint(ab, 1)": "ENABLED"}));
        let scrypta = adapter("scrypta", rpc);
        assert_eq!(
            scrypta.masternode_list().unwrap(),
            r#"{"COutPoint(ab, 1)":"ENABLED"}"#
        );

        let mut rpc = MockRpc::main();
        rpc.masternodes = Some(serde_json::Value::String("raw list".to_string()));
        assert_eq!(adapter("scrypta", rpc).masternode_list().unwrap(), "raw list");

        let harcomia = adapter("harcomia", MockRpc::main());
        let err = harcomia.masternode_list().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Unsupported));
        assert_eq!(MockRpc::calls(&harcomia.rpc().generic_calls), 0);
    }

    #[test]
    /// 1 input, 3 outputs: data carrier, paying to an address, empty script
    fn test_pack_unpack_scenario() {
        let adapter = adapter("liquid", MockRpc::main());
        let p2pkh = "76a914d79c1c8b67a0275c60e33b67bbd0e19a79b9276388ac";
        let address = "QGvRRFXBM2feXuU39EwHNuYYSrnM3HaUyM";
        let tx = Tx {
            hex: Some("0200".to_string()),
            txid: "7aa1af9481f2d744c96015b1baea6ba753790971ff265adfd93775de0234bfd6".to_string(),
            version: 2,
            lock_time: 82054,
            vin: vec![Vin {
                coinbase: None,
                txid: "757d23cec40eef9728417e68a5c6fb70b35e4fe58d34da55f305b013d24795a9"
                    .to_string(),
                vout: 2,
                script_sig: ScriptSig {
                    hex: "0014d79c1c8b67a0275c60e33b67bbd0e19a79b92763".to_string(),
                },
                sequence: 4294967294,
                addresses: Vec::new(),
            }],
            vout: vec![
                Vout {
                    value_sat: 0,
                    n: 0,
                    script_pub_key: ScriptPubKey {
                        hex: "6a0b68656c6c6f20776f726c64".to_string(),
                        addresses: Vec::new(),
                    },
                },
                Vout {
                    value_sat: 123456789,
                    n: 1,
                    script_pub_key: ScriptPubKey {
                        hex: p2pkh.to_string(),
                        addresses: vec![address.to_string()],
                    },
                },
                Vout {
                    value_sat: 1152,
                    n: 2,
                    script_pub_key: ScriptPubKey::default(),
                },
            ],
            confirmations: 0,
            time: 1544039759,
            block_time: 1544039759,
        };

        let packed = adapter.pack_tx(&tx, 82055, 1544039759).unwrap();
        let (unpacked, height) = adapter.unpack_tx(&packed).unwrap();
        assert_eq!(height, 82055);
        assert_eq!(unpacked.vin.len(), 1);
        assert_eq!(unpacked.vout.len(), 3);
        let values: Vec<u64> = unpacked.vout.iter().map(|v| v.value_sat).collect();
        assert_eq!(values, vec![0, 123456789, 1152]);
        assert_eq!(unpacked.vout[1].script_pub_key.addresses, vec![address.to_string()]);
        assert!(unpacked.vout[2].script_pub_key.addresses.is_empty());
        assert_eq!(unpacked.hex, Some("0200".to_string()));
        assert_eq!(unpacked.vin, tx.vin);

        // cached addresses agree with the ones derived from the scripts
        let derived: Vec<Vec<String>> = unpacked
            .vout
            .iter()
            .map(|v| {
                adapter
                    .addresses_from_script(&v.script_pub_key.hex)
                    .unwrap()
                    .addresses
            })
            .collect();
        let cached: Vec<Vec<String>> = unpacked
            .vout
            .iter()
            .map(|v| v.script_pub_key.addresses.clone())
            .collect();
        assert_eq!(derived, cached);

        // same bytes, same transaction
        assert_eq!(adapter.unpack_tx(&packed).unwrap(), (unpacked, height));
    }

    #[test]
    fn test_unpack_garbage() {
        let adapter = adapter("liquid", MockRpc::main());
        for bytes in &[&b""[..], &[0x02][..], &[0x01, 0x80][..], &[0x01, 0, 0, 0xff][..]] {
            let err = adapter.unpack_tx(bytes).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::Decode { .. }), "{:?}", bytes);
        }
    }

    #[test]
    fn test_address_script_round_trip() {
        let adapter = adapter("scrypta", MockRpc::main());
        for script in &[
            "76a91412ab8dc588ca9d5787dde7eb29569da63c3a238c88ac",
            "a914e9c3dd0c07aac76179ebc76a6c78d4d67c6c160a87",
        ] {
            let info = adapter.addresses_from_script(script).unwrap();
            assert!(info.searchable);
            assert_eq!(info.addresses.len(), 1);
            let rebuilt = adapter.script_from_address(&info.addresses[0]).unwrap();
            assert_eq!(rebuilt.to_hex(), *script);
        }
        let info = adapter
            .addresses_from_script("76a91412ab8dc588ca9d5787dde7eb29569da63c3a238c88ac")
            .unwrap();
        assert_eq!(info.pattern, ScriptType::Pay2PublicKeyHash);
        assert_eq!(info.addresses, vec!["LLvfwS3dGrcagxqF8hLokeTgjb92FzgJw6"]);

        // a harcomia address means nothing on scrypta
        let err = adapter
            .script_from_address("hGW395YcCEi9DW5kQWfNyAcbTpY5E1Ngu2")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidAddress));

        let err = adapter.addresses_from_script("zz").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::HexError(_)));
    }
}
