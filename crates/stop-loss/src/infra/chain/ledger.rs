//! An in-memory ERC20 ledger for many tokens.

use {
    crate::domain::{
        eth::{Address, TokenAddress, U256},
        price,
        venue::{self, Transfer},
    },
    anyhow::{Context, anyhow, ensure},
    std::{
        collections::HashMap,
        sync::{Mutex, PoisonError},
    },
};

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Default)]
struct State {
    tokens: HashMap<TokenAddress, TokenInfo>,
    balances: HashMap<(TokenAddress, Address), U256>,
    allowances: HashMap<(TokenAddress, Address, Address), U256>,
}

/// A single balance change. Moves with a spender consume allowance.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub token: TokenAddress,
    pub spender: Option<Address>,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<State>,
}

impl Ledger {
    pub fn register(&self, token: TokenAddress, info: TokenInfo) {
        self.state().tokens.insert(token, info);
    }

    pub fn token(&self, token: TokenAddress) -> Option<TokenInfo> {
        self.state().tokens.get(&token).cloned()
    }

    pub fn tokens(&self) -> Vec<TokenAddress> {
        self.state().tokens.keys().copied().collect()
    }

    pub fn mint(&self, token: TokenAddress, to: Address, amount: U256) -> anyhow::Result<()> {
        let mut state = self.state();
        ensure!(state.tokens.contains_key(&token), "unknown token {token}");
        let balance = state.balances.entry((token, to)).or_default();
        *balance = balance
            .checked_add(amount)
            .context("balance overflow")?;
        Ok(())
    }

    pub fn approve(&self, token: TokenAddress, owner: Address, spender: Address, amount: U256) {
        self.state()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn balance(&self, token: TokenAddress, owner: Address) -> U256 {
        self.state()
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: TokenAddress, owner: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Applies all moves or none of them.
    pub fn apply(&self, moves: &[Move]) -> anyhow::Result<()> {
        let mut state = self.state();
        let mut next = state.clone();
        for m in moves {
            ensure!(next.tokens.contains_key(&m.token), "unknown token {}", m.token);
            ensure!(m.to != Address::ZERO, "transfer to the zero address");
            if let Some(spender) = m.spender {
                let allowance = next
                    .allowances
                    .entry((m.token, m.from, spender))
                    .or_default();
                // An unlimited approval is never consumed.
                if *allowance != U256::MAX {
                    *allowance = allowance.checked_sub(m.amount).ok_or_else(|| {
                        anyhow!("{spender} is not approved to move {} {}", m.amount, m.token)
                    })?;
                }
            }
            let from = next.balances.entry((m.token, m.from)).or_default();
            *from = from.checked_sub(m.amount).ok_or_else(|| {
                anyhow!("{} holds less than {} {}", m.from, m.amount, m.token)
            })?;
            let to = next.balances.entry((m.token, m.to)).or_default();
            *to = to.checked_add(m.amount).context("balance overflow")?;
        }
        *state = next;
        Ok(())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl venue::Ledger for Ledger {
    async fn balance_of(&self, token: TokenAddress, owner: Address) -> anyhow::Result<U256> {
        Ok(self.balance(token, owner))
    }

    async fn transfer(
        &self,
        token: TokenAddress,
        from: Address,
        to: Address,
        amount: U256,
    ) -> anyhow::Result<()> {
        self.apply(&[Move {
            token,
            spender: None,
            from,
            to,
            amount,
        }])
    }

    async fn transfer_from(
        &self,
        token: TokenAddress,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> anyhow::Result<()> {
        self.apply(&[Move {
            token,
            spender: Some(spender),
            from,
            to,
            amount,
        }])
    }

    async fn transfer_batch(&self, from: Address, transfers: Vec<Transfer>) -> anyhow::Result<()> {
        let moves = transfers
            .into_iter()
            .map(|transfer| Move {
                token: transfer.asset.token,
                spender: None,
                from,
                to: transfer.to,
                amount: transfer.asset.amount,
            })
            .collect::<Vec<_>>();
        self.apply(&moves)
    }
}

#[async_trait::async_trait]
impl price::Tokens for Ledger {
    async fn decimals(&self, token: TokenAddress) -> anyhow::Result<u8> {
        self.token(token)
            .map(|info| info.decimals)
            .with_context(|| format!("unknown token {token}"))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::{
            eth::Asset,
            price::Tokens,
            venue::Ledger as _,
        },
    };

    fn token(byte: u8) -> TokenAddress {
        TokenAddress(Address::repeat_byte(byte))
    }

    fn account(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn ledger() -> Ledger {
        let ledger = Ledger::default();
        for (byte, symbol) in [(1, "TKN"), (2, "USDC")] {
            ledger.register(
                token(byte),
                TokenInfo {
                    symbol: symbol.into(),
                    decimals: 6,
                },
            );
        }
        ledger.mint(token(1), account(0xa), U256::from(100)).unwrap();
        ledger
    }

    #[tokio::test]
    async fn transfers_own_funds() {
        let ledger = ledger();
        ledger
            .transfer(token(1), account(0xa), account(0xb), U256::from(40))
            .await
            .unwrap();
        assert_eq!(ledger.balance(token(1), account(0xa)), U256::from(60));
        assert_eq!(
            ledger.balance_of(token(1), account(0xb)).await.unwrap(),
            U256::from(40)
        );
        assert!(
            ledger
                .transfer(token(1), account(0xb), account(0xa), U256::from(41))
                .await
                .is_err()
        );
        assert!(
            ledger
                .transfer(token(1), account(0xa), Address::ZERO, U256::from(1))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn transfer_from_consumes_allowance() {
        let ledger = ledger();
        let spender = account(0xc);
        assert!(
            ledger
                .transfer_from(token(1), spender, account(0xa), spender, U256::from(1))
                .await
                .is_err()
        );

        ledger.approve(token(1), account(0xa), spender, U256::from(30));
        ledger
            .transfer_from(token(1), spender, account(0xa), account(0xb), U256::from(20))
            .await
            .unwrap();
        assert_eq!(
            ledger.allowance(token(1), account(0xa), spender),
            U256::from(10)
        );
        assert!(
            ledger
                .transfer_from(token(1), spender, account(0xa), account(0xb), U256::from(11))
                .await
                .is_err()
        );

        ledger.approve(token(1), account(0xa), spender, U256::MAX);
        ledger
            .transfer_from(token(1), spender, account(0xa), account(0xb), U256::from(80))
            .await
            .unwrap();
        assert_eq!(ledger.allowance(token(1), account(0xa), spender), U256::MAX);
        assert_eq!(ledger.balance(token(1), account(0xb)), U256::from(100));
    }

    #[tokio::test]
    async fn batches_are_atomic() {
        let ledger = ledger();
        let result = ledger
            .transfer_batch(
                account(0xa),
                vec![
                    Transfer {
                        asset: Asset {
                            token: token(1),
                            amount: U256::from(50),
                        },
                        to: account(0xb),
                    },
                    Transfer {
                        asset: Asset {
                            token: token(2),
                            amount: U256::from(1),
                        },
                        to: account(0xb),
                    },
                ],
            )
            .await;
        assert!(result.is_err());
        assert_eq!(ledger.balance(token(1), account(0xa)), U256::from(100));
        assert_eq!(ledger.balance(token(1), account(0xb)), U256::ZERO);
    }

    #[tokio::test]
    async fn reports_decimals() {
        let ledger = ledger();
        assert_eq!(ledger.decimals(token(2)).await.unwrap(), 6);
        assert!(ledger.decimals(token(3)).await.is_err());
        assert!(ledger.mint(token(3), account(0xa), U256::from(1)).is_err());
    }
}
