//! Metric extractors.
//!
//! Each extractor issues one or more RPC calls through the shared transport
//! and decodes the raw result into a typed value. Extractors hold no state of
//! their own, so any number of them can run concurrently.

use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::value::RawValue;

use nodepulse_core::methods::is_hex_quantity;
use nodepulse_core::{BlockRef, RpcCall, RpcTransport};

use crate::error::MetricError;
use crate::types::{BlockTimestamp, HexQuantity, TransactionPoolStatus, TransactionReceipt};

#[derive(Deserialize)]
struct BlockHeader {
    timestamp: String,
}

#[derive(Deserialize)]
struct BlockTransactions {
    transactions: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct PoolCounts {
    pending: String,
    queued: String,
}

#[derive(Deserialize)]
struct ReceiptFields {
    #[serde(rename = "transactionHash")]
    hash: String,
    from: String,
    to: Option<String>,
    status: Option<String>,
}

/// Operational metrics of one node, read through an [`RpcTransport`].
#[derive(Clone)]
pub struct NodeMetrics {
    transport: Arc<dyn RpcTransport>,
}

impl NodeMetrics {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Timestamp of the chain head.
    pub async fn block_time(&self) -> Result<BlockTimestamp, MetricError> {
        let header: BlockHeader = self.head_block(false).await?;
        Ok(BlockTimestamp::new(header.timestamp))
    }

    /// Number of transactions in the chain head. An empty block yields `0`.
    pub async fn transaction_throughput(&self) -> Result<usize, MetricError> {
        let body: BlockTransactions = self.head_block(true).await?;
        Ok(body.transactions.len())
    }

    /// Pending and queued transaction counts of the node's pool.
    pub async fn pool_status(&self) -> Result<TransactionPoolStatus, MetricError> {
        let call = RpcCall::TxPoolStatus;
        let method = call.method();
        let counts: PoolCounts = decode(method, &self.fetch(&call).await?)?;

        let quantity = |field: &str, raw: &str| {
            HexQuantity::parse(raw)
                .ok_or_else(|| MetricError::decode(method, format!("{field} is not a hex quantity: {raw:?}")))
        };
        Ok(TransactionPoolStatus {
            pending: quantity("pending", &counts.pending)?,
            queued: quantity("queued", &counts.queued)?,
        })
    }

    /// Receipt of `tx_hash`; `NotFound` while the transaction is unmined or unknown.
    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, MetricError> {
        let call = RpcCall::TransactionReceipt {
            hash: tx_hash.to_string(),
        };
        let result = self.fetch(&call).await?;
        if is_null(&result) {
            return Err(MetricError::NotFound {
                what: format!("receipt for {tx_hash}"),
            });
        }

        let fields: ReceiptFields = decode(call.method(), &result)?;
        Ok(TransactionReceipt {
            hash: fields.hash,
            sender: fields.from,
            recipient: fields.to,
            status: fields.status,
        })
    }

    /// Nonce-style transaction count of `address` at `block`, as the raw hex
    /// string the node returned.
    pub async fn transaction_count(&self, address: &str, block: &BlockRef) -> Result<String, MetricError> {
        let call = RpcCall::TransactionCount {
            address: address.to_string(),
            block: block.clone(),
        };
        let count: String = decode(call.method(), &self.fetch(&call).await?)?;
        if !is_hex_quantity(&count) {
            return Err(MetricError::decode(
                call.method(),
                format!("count is not a hex quantity: {count:?}"),
            ));
        }
        Ok(count)
    }

    /// Step one of the head-block pipeline: the current block number.
    pub async fn head_block_number(&self) -> Result<BlockRef, MetricError> {
        let call = RpcCall::BlockNumber;
        let number: String = decode(call.method(), &self.fetch(&call).await?)?;
        BlockRef::from_quantity(&number).map_err(|e| MetricError::decode(call.method(), e.to_string()))
    }

    /// Two-step pipeline: read the head number, then fetch and decode that
    /// exact block.
    ///
    /// The second call takes the first call's result as its argument, so the
    /// steps can never run in parallel.
    async fn head_block<T: DeserializeOwned>(&self, full_transactions: bool) -> Result<T, MetricError> {
        let number = self.head_block_number().await?;
        let call = RpcCall::BlockByNumber {
            block: number.clone(),
            full_transactions,
        };
        let block = self.fetch(&call).await?;
        if is_null(&block) {
            return Err(MetricError::NotFound {
                what: format!("block {number}"),
            });
        }
        decode(call.method(), &block)
    }

    async fn fetch(&self, call: &RpcCall) -> Result<Box<RawValue>, MetricError> {
        let method = call.method();
        self.transport
            .request(call)
            .await
            .map_err(|source| MetricError::Call { method, source })
    }
}

fn decode<T: DeserializeOwned>(method: &'static str, raw: &RawValue) -> Result<T, MetricError> {
    serde_json::from_str(raw.get()).map_err(|e| MetricError::decode(method, e.to_string()))
}

fn is_null(raw: &RawValue) -> bool {
    raw.get() == "null"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNode;
    use nodepulse_core::TransportError;
    use serde_json::{json, Value};

    const HASH: &str = "0x4cd2c562d4fbf475a549daad43b64135d5b4ec62c0eef57305ff809a3fd790c7";
    const ADDR: &str = "0xef11D1c2aA48826D4c41e54ab82D1Ff5Ad8A64Ca";

    fn metrics(node: MockNode) -> (NodeMetrics, Arc<MockNode>) {
        let node = Arc::new(node);
        (NodeMetrics::new(node.clone()), node)
    }

    // ─── Block time ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn block_time_reads_timestamp_of_reported_head() {
        let (m, node) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x5"))
                .result_for(
                    "eth_getBlockByNumber",
                    vec![json!("0x5"), json!(false)],
                    json!({"number": "0x5", "timestamp": "0x64", "transactions": []}),
                ),
        );

        let ts = m.block_time().await.unwrap();
        assert_eq!(ts.as_str(), "0x64");
        assert_eq!(
            node.methods_called(),
            vec!["eth_blockNumber", "eth_getBlockByNumber"]
        );
    }

    #[tokio::test]
    async fn block_time_missing_timestamp_is_decode_failure() {
        let (m, _) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x5"))
                .result("eth_getBlockByNumber", json!({"number": "0x5"})),
        );

        let err = m.block_time().await.unwrap_err();
        assert!(err.is_decode_failure(), "got {err:?}");
        assert_eq!(err.method(), Some("eth_getBlockByNumber"));
    }

    #[tokio::test]
    async fn non_string_block_number_is_decode_failure() {
        let (m, node) = metrics(MockNode::new().result("eth_blockNumber", json!(5)));

        let err = m.block_time().await.unwrap_err();
        assert!(err.is_decode_failure());
        assert_eq!(err.method(), Some("eth_blockNumber"));
        assert_eq!(node.methods_called(), vec!["eth_blockNumber"]);
    }

    #[tokio::test]
    async fn first_step_failure_is_tagged_and_stops_the_chain() {
        let (m, node) = metrics(MockNode::new().unreachable("eth_blockNumber"));

        let err = m.block_time().await.unwrap_err();
        assert_eq!(err.method(), Some("eth_blockNumber"));
        assert!(matches!(err.transport(), Some(TransportError::Http(_))));
        assert_eq!(node.methods_called(), vec!["eth_blockNumber"]);
    }

    #[tokio::test]
    async fn second_step_node_error_is_tagged_with_its_method() {
        let (m, node) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x5"))
                .error("eth_getBlockByNumber", -32000, "header not found"),
        );

        let err = m.block_time().await.unwrap_err();
        assert_eq!(err.method(), Some("eth_getBlockByNumber"));
        let rpc = err.rpc_error().expect("node error");
        assert_eq!(rpc.code, -32000);
        assert_eq!(rpc.message, "header not found");
        assert_eq!(
            node.methods_called(),
            vec!["eth_blockNumber", "eth_getBlockByNumber"]
        );
    }

    #[tokio::test]
    async fn missing_head_block_is_not_found() {
        let (m, _) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x5"))
                .result("eth_getBlockByNumber", Value::Null),
        );

        let err = m.block_time().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "block 0x5 not found");
    }

    // ─── Throughput ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn throughput_counts_full_transactions() {
        let (m, node) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x10"))
                .result_for(
                    "eth_getBlockByNumber",
                    vec![json!("0x10"), json!(true)],
                    json!({"transactions": [{"hash": "0x01"}, {"hash": "0x02"}, {"hash": "0x03"}]}),
                ),
        );

        assert_eq!(m.transaction_throughput().await.unwrap(), 3);
        assert_eq!(node.calls()[1].params, vec![json!("0x10"), json!(true)]);
    }

    #[tokio::test]
    async fn empty_block_has_zero_throughput() {
        let (m, _) = metrics(
            MockNode::new()
                .result("eth_blockNumber", json!("0x5"))
                .result("eth_getBlockByNumber", json!({"transactions": []})),
        );

        assert_eq!(m.transaction_throughput().await.unwrap(), 0);
    }

    // ─── Pool status ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn pool_status_decodes_counts() {
        let (m, _) = metrics(
            MockNode::new().result("txpool_status", json!({"pending": "0x3", "queued": "0x0"})),
        );

        let status = m.pool_status().await.unwrap();
        assert_eq!(status.pending.as_str(), "0x3");
        assert_eq!(status.queued.as_str(), "0x0");
        assert_eq!(status.pending.value(), 3);
        assert_eq!(status.total(), 3);
    }

    #[tokio::test]
    async fn pool_status_rejects_non_hex_counts() {
        let (m, _) = metrics(
            MockNode::new().result("txpool_status", json!({"pending": "three", "queued": "0x0"})),
        );

        let err = m.pool_status().await.unwrap_err();
        assert!(err.is_decode_failure());
        assert!(err.to_string().contains("pending"));
    }

    #[tokio::test]
    async fn pool_status_unsupported_by_node() {
        let (m, _) = metrics(MockNode::new());

        let err = m.pool_status().await.unwrap_err();
        let rpc = err.rpc_error().expect("node error");
        assert_eq!(rpc.code, -32601);
    }

    // ─── Receipt ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn receipt_fields_are_mapped() {
        let (m, _) = metrics(MockNode::new().result(
            "eth_getTransactionReceipt",
            json!({
                "transactionHash": HASH,
                "from": "0x1111111111111111111111111111111111111111",
                "to": "0x2222222222222222222222222222222222222222",
                "status": "0x1",
                "gasUsed": "0x5208"
            }),
        ));

        let r = m.transaction_receipt(HASH).await.unwrap();
        assert_eq!(r.hash, HASH);
        assert_eq!(r.sender, "0x1111111111111111111111111111111111111111");
        assert_eq!(
            r.recipient.as_deref(),
            Some("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(r.succeeded(), Some(true));
    }

    #[tokio::test]
    async fn contract_creation_receipt_has_no_recipient() {
        let (m, _) = metrics(MockNode::new().result(
            "eth_getTransactionReceipt",
            json!({"transactionHash": HASH, "from": "0x11", "to": null, "status": "0x0"}),
        ));

        let r = m.transaction_receipt(HASH).await.unwrap();
        assert_eq!(r.recipient, None);
        assert_eq!(r.succeeded(), Some(false));
    }

    #[tokio::test]
    async fn null_receipt_is_not_found() {
        let (m, _) = metrics(MockNode::new().result("eth_getTransactionReceipt", Value::Null));

        let err = m.transaction_receipt(HASH).await.unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[tokio::test]
    async fn receipt_from_empty_envelope_is_a_call_failure() {
        let (m, _) = metrics(MockNode::new().empty("eth_getTransactionReceipt"));

        let err = m.transaction_receipt(HASH).await.unwrap_err();
        assert!(!err.is_not_found(), "got {err:?}");
        assert!(
            matches!(err.transport(), Some(TransportError::InvalidEnvelope(_))),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn malformed_receipt_is_decode_failure() {
        let (m, _) = metrics(MockNode::new().result("eth_getTransactionReceipt", json!("0xdead")));

        let err = m.transaction_receipt(HASH).await.unwrap_err();
        assert!(err.is_decode_failure(), "got {err:?}");
    }

    #[tokio::test]
    async fn bad_hash_is_rejected_before_the_wire() {
        let (m, node) = metrics(MockNode::new());

        let err = m.transaction_receipt("0x1234").await.unwrap_err();
        assert!(matches!(err.transport(), Some(TransportError::InvalidParams(_))));
        assert!(node.calls().is_empty());
    }

    // ─── Address transaction count ────────────────────────────────────────────

    #[tokio::test]
    async fn transaction_count_returns_raw_hex() {
        let (m, node) = metrics(MockNode::new().result_for(
            "eth_getTransactionCount",
            vec![json!(ADDR), json!("latest")],
            json!("0x1a"),
        ));

        let count = m.transaction_count(ADDR, &BlockRef::Latest).await.unwrap();
        assert_eq!(count, "0x1a");
        assert_eq!(node.calls().len(), 1);
    }

    #[tokio::test]
    async fn transaction_count_at_explicit_block() {
        let (m, _) = metrics(MockNode::new().result_for(
            "eth_getTransactionCount",
            vec![json!(ADDR), json!("0x1b4")],
            json!("0x0"),
        ));

        let block: BlockRef = "436".parse().unwrap();
        assert_eq!(m.transaction_count(ADDR, &block).await.unwrap(), "0x0");
    }

    #[tokio::test]
    async fn transaction_count_rejects_non_string() {
        let (m, _) = metrics(MockNode::new().result("eth_getTransactionCount", json!(26)));

        let err = m.transaction_count(ADDR, &BlockRef::Latest).await.unwrap_err();
        assert!(err.is_decode_failure());
    }
}
