//! [`RelayBackend`] implementation backed by `alloy`: reads code/nonces over
//! HTTP, submits transactions over the WS provider so submission and
//! confirmation share a connection.

use crate::backend::{AuthorizationParams, RelayBackend};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use alloy::eips::eip7702::{Authorization, SignedAuthorization};
use alloy::primitives::{Address as AlloyAddress, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolCall;
use arcade_types::{Action, Address, TxHash};
use async_trait::async_trait;

sol! {
    interface IDelegation {
        function execute(address to, uint256 value, bytes calldata data, uint256 deadline, bytes calldata signature) external;
        function getNonce(address account) external view returns (uint256);
    }
}

sol! {
    interface IVoteGame {
        function vote(uint8 action) external;
    }
}

fn to_alloy_address(addr: Address) -> AlloyAddress {
    AlloyAddress::from(addr.0)
}

fn from_alloy_address(addr: AlloyAddress) -> Address {
    Address(addr.into_array())
}

/// Classify a `send_transaction` failure per the §4.6 error table: an
/// underfunded relay wallet and a stale local nonce get their own status
/// codes, everything else falls through to the generic chain error.
fn classify_send_error<E: std::fmt::Display>(e: E) -> RelayError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") {
        RelayError::WalletUnderfunded
    } else if lower.contains("nonce too low") || lower.contains("replacement transaction underpriced") {
        RelayError::NonceConflict
    } else {
        RelayError::Chain(message)
    }
}

/// An `alloy`-backed relay: one HTTP provider for reads, one signer-backed
/// WS provider for submissions.
pub struct AlloyRelayBackend {
    signer: PrivateKeySigner,
    vote_contract: AlloyAddress,
    delegation_contract: AlloyAddress,
    ws_url: String,
    http_url: String,
    chain_id: u64,
    first_use_gas_limit: u64,
    subsequent_gas_limit: u64,
}

impl AlloyRelayBackend {
    /// Build a backend from a [`RelayConfig`] and the relay's private key.
    pub fn new(config: &RelayConfig, signer: PrivateKeySigner) -> Result<Self> {
        let vote_contract: AlloyAddress = config
            .vote_contract_address
            .parse()
            .map_err(|e| RelayError::Chain(format!("invalid vote contract address: {e}")))?;
        Ok(Self {
            signer,
            vote_contract,
            delegation_contract: AlloyAddress::from(config.delegation_contract_address),
            ws_url: config.ws_url.clone(),
            http_url: config.http_url.clone(),
            chain_id: config.chain_id,
            first_use_gas_limit: config.first_use_gas_limit,
            subsequent_gas_limit: config.subsequent_gas_limit,
        })
    }

    fn http_provider(&self) -> Result<impl Provider> {
        let url = self
            .http_url
            .parse()
            .map_err(|e| RelayError::Chain(format!("invalid http url: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }

    async fn ws_provider(&self) -> Result<impl Provider> {
        ProviderBuilder::new()
            .wallet(self.signer.clone())
            .on_ws(WsConnect::new(self.ws_url.clone()))
            .await
            .map_err(|e| RelayError::Chain(e.to_string()))
    }

    fn vote_call_data(&self, action: Action) -> Bytes {
        IVoteGame::voteCall {
            action: action.to_code(),
        }
        .abi_encode()
        .into()
    }

    fn execute_call_data(&self, deadline: u64, signature: &[u8], vote_data: Bytes) -> Bytes {
        IDelegation::executeCall {
            to: self.vote_contract,
            value: U256::ZERO,
            data: vote_data,
            deadline: U256::from(deadline),
            signature: Bytes::copy_from_slice(signature),
        }
        .abi_encode()
        .into()
    }
}

#[async_trait]
impl RelayBackend for AlloyRelayBackend {
    async fn get_code(&self, address: Address) -> Result<Vec<u8>> {
        let provider = self.http_provider()?;
        let code = provider
            .get_code_at(to_alloy_address(address))
            .await
            .map_err(|e| RelayError::Chain(e.to_string()))?;
        Ok(code.to_vec())
    }

    async fn get_execute_nonce(&self, eoa: Address) -> Result<u64> {
        let provider = self.http_provider()?;
        // Directed at the user's EOA address: delegated code reads the
        // EOA's own storage, not the delegation contract's (§4.6 note).
        let call = IDelegation::getNonceCall {
            account: to_alloy_address(eoa),
        };
        let tx = TransactionRequest::default()
            .to(to_alloy_address(eoa))
            .input(call.abi_encode().into());
        let result = provider
            .call(&tx)
            .await
            .map_err(|e| RelayError::Chain(e.to_string()))?;
        let nonce = IDelegation::getNonceCall::abi_decode_returns(&result, true)
            .map_err(|e| RelayError::Chain(format!("malformed nonce response: {e}")))?;
        Ok(nonce._0.to::<u64>())
    }

    async fn wallet_balance(&self) -> Result<u128> {
        let provider = self.http_provider()?;
        let balance = provider
            .get_balance(self.signer.address())
            .await
            .map_err(|e| RelayError::Chain(e.to_string()))?;
        Ok(balance.to::<u128>())
    }

    async fn submit_first_use(
        &self,
        user: Address,
        action: Action,
        deadline: u64,
        signature: &[u8],
        authorization: AuthorizationParams,
    ) -> Result<TxHash> {
        let vote_data = self.vote_call_data(action);
        let data = self.execute_call_data(deadline, signature, vote_data);

        let auth = Authorization {
            chain_id: U256::from(authorization.chain_id),
            address: self.delegation_contract,
            nonce: authorization.nonce,
        };
        let signed_auth = SignedAuthorization::new_unchecked(
            auth,
            authorization.y_parity,
            authorization.r.into(),
            authorization.s.into(),
        );

        let provider = self.ws_provider().await?;
        let tx = TransactionRequest::default()
            .to(to_alloy_address(user))
            .input(data.into())
            .with_authorization_list(vec![signed_auth])
            .gas_limit(self.first_use_gas_limit);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(classify_send_error)?;
        Ok(TxHash(*pending.tx_hash()))
    }

    async fn submit_subsequent(
        &self,
        user: Address,
        action: Action,
        deadline: u64,
        signature: &[u8],
    ) -> Result<TxHash> {
        let vote_data = self.vote_call_data(action);
        let data = self.execute_call_data(deadline, signature, vote_data);

        let provider = self.ws_provider().await?;
        let tx = TransactionRequest::default()
            .to(to_alloy_address(user))
            .input(data.into())
            .gas_limit(self.subsequent_gas_limit);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(classify_send_error)?;
        Ok(TxHash(*pending.tx_hash()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_conversion_round_trips() {
        let addr = Address([0x42; 20]);
        assert_eq!(from_alloy_address(to_alloy_address(addr)), addr);
    }

    #[test]
    fn classifies_insufficient_funds() {
        let err = classify_send_error("insufficient funds for gas * price + value");
        assert!(matches!(err, RelayError::WalletUnderfunded));
    }

    #[test]
    fn classifies_nonce_conflicts() {
        assert!(matches!(
            classify_send_error("nonce too low"),
            RelayError::NonceConflict
        ));
        assert!(matches!(
            classify_send_error("replacement transaction underpriced"),
            RelayError::NonceConflict
        ));
    }

    #[test]
    fn falls_back_to_chain_error() {
        assert!(matches!(
            classify_send_error("connection reset by peer"),
            RelayError::Chain(_)
        ));
    }
}
