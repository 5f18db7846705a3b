use {
    crate::domain::{
        eth::{Address, U256},
        execution::Execution,
    },
    model::{
        order::{Order, OrderData, OrderHash},
        signature::Signature,
    },
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecuteRequest {
    order: OrderData,
    signature: Signature,
    /// The least stable asset the holder accepts for the swapped amount.
    #[serde_as(as = "HexOrDecimalU256")]
    min_stable_out: U256,
    /// Receives the keeper fee.
    fee_recipient: Address,
}

impl ExecuteRequest {
    pub fn order(&self) -> Order {
        Order {
            data: self.order,
            signature: self.signature,
        }
    }

    pub fn min_stable_out(&self) -> U256 {
        self.min_stable_out
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }
}

#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Executed {
    order_hash: OrderHash,
    holder: Address,
    /// The price the trigger was evaluated against.
    #[serde_as(as = "HexOrDecimalU256")]
    price: U256,
    price_source: &'static str,
    #[serde_as(as = "HexOrDecimalU256")]
    fee_amount: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    swap_amount: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    stable_out: U256,
}

impl Executed {
    pub fn new(execution: &Execution) -> Self {
        Self {
            order_hash: execution.order_hash,
            holder: execution.holder,
            price: execution.quote.price,
            price_source: execution.quote.source.as_str(),
            fee_amount: execution.fee_amount,
            swap_amount: execution.swap_amount,
            stable_out: execution.stable_out,
        }
    }
}
