use crate::cell::CellId;
use crate::{Address, Coins};

/// Operation codes of the messages built by this crate
pub struct Opcode;

impl Opcode {
    /// TEP-74 jetton `transfer`
    pub const JETTON_TRANSFER: u32 = 0x0f8a7ea5;

    /// Wallet v5 request authenticated through an internal message
    pub const SIGNED_INTERNAL: u32 = 0x73696e74;

    /// `action_send_msg` out action
    pub const ACTION_SEND_MSG: u32 = 0x0ec3c86d;
}

pub struct Amount;

impl Amount {
    /// Value attached to the message sent to the owner's jetton wallet
    pub const JETTON_TRANSFER_VALUE: Coins = Coins::from_nano(50_000_000);

    /// Value forwarded to the recipient along with the transfer notification
    pub const FORWARD_TON_AMOUNT: Coins = Coins::from_nano(1);
}

/// Well known jetton masters
pub struct Jetton;

impl Jetton {
    /// Tether USD on mainnet (`EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs`)
    pub const USDT: Address = Address::new(
        0,
        [
            0xb1, 0x13, 0xa9, 0x94, 0xb5, 0x02, 0x4a, 0x16, 0x71, 0x9f, 0x69, 0x13, 0x93, 0x28, 0xeb, 0x75, 0x95, 0x96, 0xc3, 0x8a, 0x25, 0xf5, 0x90, 0x28,
            0xb1, 0x46, 0xfe, 0xcd, 0xc3, 0x62, 0x1d, 0xfe,
        ],
    );
}

/// Identity of the wallet v5r1 code deployed by the wallet applications
/// (`IINLe3KxEhR+Gy+0V7hOdNGjDwT3N9T2KmaOlVLSty8=`)
pub const WALLET_V5R1_CODE: CellId = CellId {
    hash: [
        0x20, 0x83, 0x4b, 0x7b, 0x72, 0xb1, 0x12, 0x14, 0x7e, 0x1b, 0x2f, 0xb4, 0x57, 0xb8, 0x4e, 0x74, 0xd1, 0xa3, 0x0f, 0x04, 0xf7, 0x37, 0xd4, 0xf6,
        0x2a, 0x66, 0x8e, 0x95, 0x52, 0xd2, 0xb7, 0x2f,
    ],
    depth: 6,
};

/// Validity window of a signed wallet request, in seconds
pub const TRANSFER_VALIDITY: u64 = 300;

/// Maximum number of out actions a wallet v5 request can carry
pub const MAX_ACTIONS: usize = 255;
