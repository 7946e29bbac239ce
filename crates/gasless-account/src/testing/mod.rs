use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gasless_ton::cell::{Cell, CellBuilder};
use gasless_ton::client::{AccountStatus, ContractState, RawGetMethodResult, StackArgument, TransactionId};
use gasless_ton::constants::Jetton;
use gasless_ton::jetton::JettonTransfer;
use gasless_ton::keys::KeyPair;
use gasless_ton::testing::MockTonProvider;
use gasless_ton::wallet::WalletConfiguration;
use gasless_ton::{Address, Coins};
use gasless_tonapi::mock::MockGaslessApi;
use gasless_tonapi::types::{EstimateRequest, GasJetton, GaslessConfig, SendRequest, SignRawMessage, SignRawParams};
use serde_json::json;

use crate::types::{PaymasterConfiguration, PaymasterTokenConfiguration, TransactionReceipt};
use crate::{AccountConfiguration, GaslessAccount, ReadOnlyAccount};

/// External message received by the fake relayer
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub state_init: Option<Cell>,
    pub body: Cell,
}

/// Shared state of the fake chain and the fake relayer
#[derive(Debug, Default)]
struct Ledger {
    seqno: AtomicU32,
    commission: AtomicU64,

    seqno_fetches: AtomicUsize,
    config_calls: AtomicUsize,
    estimate_calls: AtomicUsize,
    send_calls: AtomicUsize,

    unavailable: AtomicBool,
    reject_estimates: AtomicBool,
    reject_sends: AtomicBool,

    masters: Mutex<Vec<Address>>,
    estimated: Mutex<Vec<JettonTransfer>>,
    sent: Mutex<Vec<SentMessage>>,
    transactions: Mutex<Vec<TransactionReceipt>>,
}

/// Splits a message serialized by this workspace into its state init and its body
fn split_message(message: &Cell) -> Result<(Option<Cell>, Cell), gasless_ton::Error> {
    let mut slice = message.parse();

    if slice.load_bit()? {
        // ext_in_msg_info$10 src dest import_fee
        slice.skip_bits(1)?;
        Address::load(&mut slice)?;
        Address::load(&mut slice)?;
        Coins::load(&mut slice)?;
    } else {
        // int_msg_info$0 flags src dest value extra ihr_fee fwd_fee created_lt created_at
        slice.skip_bits(3)?;
        Address::load(&mut slice)?;
        Address::load(&mut slice)?;
        Coins::load(&mut slice)?;
        slice.skip_bits(1)?;
        Coins::load(&mut slice)?;
        Coins::load(&mut slice)?;
        slice.skip_bits(96)?;
    }

    let state_init = match slice.load_bit()? {
        true => {
            slice.skip_bits(1)?;
            Some(slice.load_ref()?)
        },
        false => None,
    };

    if slice.load_bit()? {
        return Ok((state_init, slice.load_ref()?));
    }

    let bits = slice.remaining_bits();
    let mut body = CellBuilder::new().store_bits(&slice.load_bits(bits)?, bits);
    while slice.remaining_refs() > 0 {
        body = body.store_ref(slice.load_ref()?);
    }

    Ok((state_init, body.build()?))
}

#[derive(Debug)]
struct Chain(Arc<Ledger>);

#[async_trait]
impl MockTonProvider for Chain {
    fn new() -> Self {
        Self(Arc::new(Ledger::default()))
    }

    async fn run_get_method(&self, _address: Address, method: &str, _stack: &[StackArgument]) -> Result<RawGetMethodResult, gasless_ton::Error> {
        let stack = match method {
            "seqno" => {
                self.0.seqno_fetches.fetch_add(1, Ordering::SeqCst);
                vec![json!(["num", format!("{:#x}", self.0.seqno.load(Ordering::SeqCst))])]
            },
            "get_wallet_address" => {
                let cell = CellBuilder::new().store(TestEnvironment::JETTON_WALLET).build()?;
                vec![json!(["cell", { "bytes": cell.to_boc_base64() }])]
            },
            "get_wallet_data" => vec![json!(["num", format!("{:#x}", TestEnvironment::JETTON_BALANCE.as_u128())])],
            _ => {
                return Ok(RawGetMethodResult {
                    exit_code: 11,
                    gas_used: 0,
                    stack: vec![],
                })
            },
        };

        Ok(RawGetMethodResult { exit_code: 0, gas_used: 1000, stack })
    }

    async fn get_address_information(&self, _address: Address) -> Result<ContractState, gasless_ton::Error> {
        Ok(ContractState {
            balance: 0,
            state: AccountStatus::Active,
        })
    }

    async fn get_transactions(&self, _address: Address, limit: u32, from: Option<&TransactionId>) -> Result<Vec<TransactionReceipt>, gasless_ton::Error> {
        let transactions = self.0.transactions.lock().map_err(|e| gasless_ton::Error::Internal(e.to_string()))?;

        Ok(transactions
            .iter()
            .rev()
            .skip_while(|x| from.is_some_and(|from| &x.transaction_id != from))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Debug)]
struct Relayer(Arc<Ledger>);

impl Relayer {
    fn rejected(message: &str) -> gasless_tonapi::Error {
        gasless_tonapi::Error::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }

    fn relay_message(&self) -> SignRawMessage {
        let commission = Coins::from_nano(self.0.commission.load(Ordering::SeqCst));
        let payload = JettonTransfer::new(commission, TestEnvironment::RELAY, TestEnvironment::RELAY)
            .to_cell()
            .map(|x| x.to_boc_hex())
            .ok();

        SignRawMessage {
            address: TestEnvironment::JETTON_WALLET,
            amount: Coins::from_nano(50_000_000),
            payload,
            state_init: None,
        }
    }
}

#[async_trait]
impl MockGaslessApi for Relayer {
    fn new() -> Self {
        Self(Arc::new(Ledger::default()))
    }

    async fn gasless_config(&self) -> Result<GaslessConfig, gasless_tonapi::Error> {
        self.0.config_calls.fetch_add(1, Ordering::SeqCst);
        if self.0.unavailable.load(Ordering::SeqCst) {
            return Err(gasless_tonapi::Error::Internal("relayer is down".to_string()));
        }

        Ok(GaslessConfig {
            relay_address: TestEnvironment::RELAY,
            gas_jettons: vec![GasJetton { master_id: Jetton::USDT }],
        })
    }

    async fn gasless_estimate(&self, master: Address, request: &EstimateRequest) -> Result<SignRawParams, gasless_tonapi::Error> {
        self.0.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if self.0.reject_estimates.load(Ordering::SeqCst) {
            return Err(Self::rejected("insufficient jetton balance"));
        }

        let message = request
            .messages
            .first()
            .ok_or(Self::rejected("no message to estimate"))?;
        let (_, body) = split_message(&Cell::from_boc_hex(&message.boc)?)?;
        let transfer = JettonTransfer::load(&mut body.parse())?;

        self.0.masters.lock().map_err(|e| gasless_tonapi::Error::Internal(e.to_string()))?.push(master);
        self.0.estimated.lock().map_err(|e| gasless_tonapi::Error::Internal(e.to_string()))?.push(transfer);

        Ok(SignRawParams {
            relay_address: TestEnvironment::RELAY,
            commission: Coins::from_nano(self.0.commission.load(Ordering::SeqCst)),
            from: Some(request.wallet_address),
            valid_until: 1_700_000_000,
            messages: vec![self.relay_message()],
        })
    }

    async fn gasless_send(&self, request: &SendRequest) -> Result<(), gasless_tonapi::Error> {
        self.0.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.0.reject_sends.load(Ordering::SeqCst) {
            return Err(Self::rejected("message expired"));
        }

        let message = Cell::from_boc_hex(&request.boc)?;
        let (state_init, body) = split_message(&message)?;

        let mut transactions = self.0.transactions.lock().map_err(|e| gasless_tonapi::Error::Internal(e.to_string()))?;
        let transaction: TransactionReceipt = serde_json::from_value(json!({
            "transaction_id": { "lt": (transactions.len() + 1).to_string(), "hash": STANDARD.encode(message.hash()) },
            "utime": 1_700_000_000,
            "fee": "0",
            "in_msg": { "msg_data": { "body": body.to_boc_base64() } },
            "out_msgs": []
        }))
        .map_err(|e| gasless_tonapi::Error::Format(e.to_string()))?;

        transactions.push(transaction);
        drop(transactions);

        self.0.sent.lock().map_err(|e| gasless_tonapi::Error::Internal(e.to_string()))?.push(SentMessage { state_init, body });
        self.0.seqno.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

/// Fake chain and relayer sharing a ledger, accounts built from it see every transfer they send
pub struct TestEnvironment {
    ledger: Arc<Ledger>,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvironment {
    pub const SECRET_KEY: &'static str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    pub const RELAY: Address = Address::new(0, [0x33; 32]);
    pub const RECIPIENT: Address = Address::new(0, [0x44; 32]);
    pub const JETTON_WALLET: Address = Address::new(0, [0x55; 32]);
    pub const OTHER_JETTON: Address = Address::new(0, [0x66; 32]);

    pub const JETTON_BALANCE: Coins = Coins::from_nano(1_000_000_000);

    pub fn new() -> Self {
        let ledger = Ledger::default();
        ledger.commission.store(5_000_000, Ordering::SeqCst);

        Self { ledger: Arc::new(ledger) }
    }

    pub fn with_commission(self, commission: u64) -> Self {
        self.ledger.commission.store(commission, Ordering::SeqCst);
        self
    }

    pub fn with_unavailable_relayer(self) -> Self {
        self.ledger.unavailable.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_rejected_estimates(self) -> Self {
        self.ledger.reject_estimates.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_rejected_sends(self) -> Self {
        self.ledger.reject_sends.store(true, Ordering::SeqCst);
        self
    }

    pub fn configuration(&self, transfer_max_fee: Option<Coins>) -> AccountConfiguration {
        AccountConfiguration {
            ton: Some(gasless_ton::Configuration::Mock(Arc::new(Chain(self.ledger.clone())))),
            tonapi: Some(gasless_tonapi::Configuration::Mock(Arc::new(Relayer(self.ledger.clone())))),
            paymaster: PaymasterConfiguration {
                paymaster_token: PaymasterTokenConfiguration { address: Jetton::USDT },
                transfer_max_fee,
            },
            wallet: WalletConfiguration {
                workchain: 0,
                subwallet_number: 0,
                network_global_id: None,
                code: Some(Cell::empty().to_boc_base64()),
            },
        }
    }

    pub fn account(&self, transfer_max_fee: Option<Coins>) -> GaslessAccount {
        let key_pair = KeyPair::from_hex(Self::SECRET_KEY).expect("invalid test secret key");

        GaslessAccount::new(key_pair, &self.configuration(transfer_max_fee)).expect("invalid test account")
    }

    pub fn read_only(&self) -> ReadOnlyAccount {
        let key_pair = KeyPair::from_hex(Self::SECRET_KEY).expect("invalid test secret key");

        ReadOnlyAccount::new(key_pair.public_key(), &self.configuration(None)).expect("invalid test account")
    }

    /// Internal message the relayer asks the wallet to send
    pub fn relay_message(&self) -> Result<Cell, gasless_tonapi::Error> {
        Ok(Relayer(self.ledger.clone()).relay_message().to_internal_message()?.to_cell()?)
    }

    pub fn seqno(&self) -> u32 {
        self.ledger.seqno.load(Ordering::SeqCst)
    }

    pub fn seqno_fetches(&self) -> usize {
        self.ledger.seqno_fetches.load(Ordering::SeqCst)
    }

    pub fn config_calls(&self) -> usize {
        self.ledger.config_calls.load(Ordering::SeqCst)
    }

    pub fn estimate_calls(&self) -> usize {
        self.ledger.estimate_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.ledger.send_calls.load(Ordering::SeqCst)
    }

    /// Paymaster tokens of every estimation, oldest first
    pub fn estimated_masters(&self) -> Vec<Address> {
        self.ledger.masters.lock().map(|x| x.clone()).unwrap_or_default()
    }

    /// Jetton transfers submitted for estimation, oldest first
    pub fn estimated_transfers(&self) -> Vec<JettonTransfer> {
        self.ledger.estimated.lock().map(|x| x.clone()).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.ledger.sent.lock().map(|x| x.clone()).unwrap_or_default()
    }
}
