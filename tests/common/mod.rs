//! Scripted collaborators for integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tx_submitter::blockchain::{
    ChainClient, ChainError, ChainResult, FeeSnapshot, Receipt, TransactionSender,
};
use tx_submitter::config::SubmissionConfig;
use tx_submitter::monitor::{MonitorError, NetworkStateQuery};
use tx_submitter::reactive::ReactiveValue;
use tx_submitter::submission::SubmissionEngine;

pub const SENDER: Address = Address::repeat_byte(0x5e);
pub const CHAIN_ID: u64 = 1;

/// Chain and signer in one, answering from per-call scripts.
///
/// Exhausted send and receipt scripts fall back to success, so a test only
/// scripts the failures it cares about.
pub struct FakeChain {
    fees: Mutex<FeeSnapshot>,
    estimate: Mutex<ChainResult<u64>>,
    nonce: Mutex<ChainResult<u64>>,
    sends: Mutex<VecDeque<ChainResult<()>>>,
    receipts: Mutex<VecDeque<ChainResult<Receipt>>>,
    replay: Mutex<ChainResult<Bytes>>,

    pub estimate_calls: AtomicU32,
    pub send_calls: AtomicU32,
    sent: Mutex<Vec<TransactionRequest>>,
    replay_blocks: Mutex<Vec<Option<u64>>>,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fees: Mutex::new(FeeSnapshot::legacy(100)),
            estimate: Mutex::new(Ok(100_000)),
            nonce: Mutex::new(Ok(7)),
            sends: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(VecDeque::new()),
            replay: Mutex::new(Ok(Bytes::new())),
            estimate_calls: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
            replay_blocks: Mutex::new(Vec::new()),
        })
    }

    pub fn set_fees(&self, fees: FeeSnapshot) {
        *self.fees.lock().unwrap() = fees;
    }

    pub fn set_estimate(&self, estimate: ChainResult<u64>) {
        *self.estimate.lock().unwrap() = estimate;
    }

    pub fn set_nonce(&self, nonce: ChainResult<u64>) {
        *self.nonce.lock().unwrap() = nonce;
    }

    pub fn set_replay(&self, replay: ChainResult<Bytes>) {
        *self.replay.lock().unwrap() = replay;
    }

    /// Broadcast errors, one per attempt, in order.
    pub fn fail_sends(&self, errors: impl IntoIterator<Item = &'static str>) {
        self.sends
            .lock()
            .unwrap()
            .extend(errors.into_iter().map(|e| Err(ChainError::rpc(e))));
    }

    pub fn script_receipts(&self, receipts: impl IntoIterator<Item = ChainResult<Receipt>>) {
        self.receipts.lock().unwrap().extend(receipts);
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replay_blocks(&self) -> Vec<Option<u64>> {
        self.replay_blocks.lock().unwrap().clone()
    }

    pub fn sends(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn estimates(&self) -> u32 {
        self.estimate_calls.load(Ordering::SeqCst)
    }
}

/// Hash of the n-th broadcast, 1-based.
pub fn tx_hash(n: u32) -> TxHash {
    TxHash::with_last_byte(n as u8)
}

pub fn receipt(tx_hash: TxHash, status: bool) -> Receipt {
    Receipt {
        transaction_hash: tx_hash,
        block_number: Some(10),
        status,
        gas_used: 90_000,
        logs: Vec::new(),
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn fee_snapshot(&self) -> ChainResult<FeeSnapshot> {
        Ok(*self.fees.lock().unwrap())
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> ChainResult<u64> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        self.estimate.lock().unwrap().clone()
    }

    async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        assert_eq!(address, SENDER);
        self.nonce.lock().unwrap().clone()
    }

    async fn call(&self, _request: &TransactionRequest, block: Option<u64>) -> ChainResult<Bytes> {
        self.replay_blocks.lock().unwrap().push(block);
        self.replay.lock().unwrap().clone()
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: u64,
        _wait: Duration,
    ) -> ChainResult<Receipt> {
        self.receipts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(receipt(tx_hash, true)))
            .map(|receipt| Receipt {
                transaction_hash: tx_hash,
                ..receipt
            })
    }
}

#[async_trait]
impl TransactionSender for FakeChain {
    fn address(&self) -> Address {
        SENDER
    }

    async fn send_transaction(&self, request: TransactionRequest) -> ChainResult<TxHash> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().unwrap().push(request);
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
            .map(|()| tx_hash(n))
    }
}

pub fn settings() -> SubmissionConfig {
    SubmissionConfig {
        gas_bump_permille: 1_200,
        max_attempts: 0,
        ..Default::default()
    }
}

pub fn engine(
    chain: &Arc<FakeChain>,
    paused: bool,
    authorized: bool,
    settings: SubmissionConfig,
) -> SubmissionEngine {
    SubmissionEngine::new(
        chain.clone(),
        chain.clone(),
        ReactiveValue::constant(paused),
        ReactiveValue::constant(authorized),
        settings,
        CHAIN_ID,
    )
}

/// Network state answers, one per query; exhausted scripts fail.
pub struct FakeQuery {
    answers: Mutex<VecDeque<Result<bool, MonitorError>>>,
    pub calls: AtomicU32,
}

impl FakeQuery {
    pub fn new(answers: Vec<Result<bool, MonitorError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<bool, MonitorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MonitorError::Chain(ChainError::rpc("script exhausted"))))
    }
}

pub fn down() -> Result<bool, MonitorError> {
    Err(MonitorError::Chain(ChainError::rpc("connection refused")))
}

#[async_trait]
impl NetworkStateQuery for FakeQuery {
    async fn is_paused(&self) -> Result<bool, MonitorError> {
        self.next()
    }

    async fn is_authorized(
        &self,
        _operator: Address,
        _principal: Address,
    ) -> Result<bool, MonitorError> {
        self.next()
    }
}
