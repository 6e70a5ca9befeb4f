//! HTTP surface for the relay (§4.6): one submission endpoint and three
//! read-only lookups.

use crate::backend::{AuthorizationParams, RelayBackend};
use crate::config::RelayConfig;
use crate::delegation_cache::DelegationCache;
use crate::error::{RelayError, Result};
use alloy::primitives::Signature as AlloySignature;
use arcade_types::Address;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use validator::Validate;

/// Shared state for every relay handler.
#[derive(Clone)]
pub struct RelayState {
    backend: Arc<dyn RelayBackend>,
    delegation: Arc<DelegationCache>,
    config: Arc<RelayConfig>,
}

impl RelayState {
    pub fn new(backend: Arc<dyn RelayBackend>, config: RelayConfig) -> Self {
        let delegation = Arc::new(DelegationCache::new(
            backend.clone(),
            config.delegation_contract_address,
        ));
        Self {
            backend,
            delegation,
            config: Arc::new(config),
        }
    }
}

/// Builds the relay's router, ready to `.merge()` into the node's main
/// router or serve standalone.
pub fn relay_routes() -> Router<RelayState> {
    Router::new()
        .route("/relay", post(submit_vote))
        .route("/relay/nonce/{address}", get(get_nonce))
        .route("/relay/delegated/{address}", get(get_delegated))
        .route("/relay/health", get(get_health))
}

#[derive(Debug, Deserialize, Validate)]
struct RelayRequest {
    #[serde(rename = "userAddress")]
    user_address: String,
    action: u8,
    deadline: u64,
    #[serde(rename = "signature")]
    #[validate(length(min = 130, max = 132))]
    signature_hex: String,
    authorization: Option<AuthorizationRequest>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationRequest {
    #[serde(rename = "chainId")]
    chain_id: u64,
    nonce: u64,
    r: String,
    s: String,
    #[serde(rename = "yParity")]
    y_parity: u8,
}

#[derive(Debug, Serialize)]
struct RelayResponse {
    #[serde(rename = "txHash")]
    tx_hash: String,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    delegated: bool,
}

fn parse_address(s: &str) -> Result<Address> {
    Address::parse(s).map_err(|e| RelayError::BadRequest(format!("invalid address: {e}")))
}

fn parse_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N]> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let decoded =
        hex::decode(trimmed).map_err(|e| RelayError::BadRequest(format!("invalid hex: {e}")))?;
    decoded
        .try_into()
        .map_err(|_| RelayError::BadRequest(format!("expected {N} bytes of hex")))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Recover the signer address for a vote intent `(user, action, deadline)`.
fn recover_signer(user: Address, action: u8, deadline: u64, signature_hex: &str) -> Result<Address> {
    let raw = parse_fixed_hex::<65>(signature_hex)?;
    let signature = AlloySignature::try_from(raw.as_slice())
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;
    let message = format!("vote:{}:{}:{}", user.to_hex(), action, deadline);
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;
    Ok(Address(recovered.into_array()))
}

async fn submit_vote(
    State(state): State<RelayState>,
    Json(req): Json<RelayRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| RelayError::BadRequest(e.to_string()))?;

    let action = arcade_types::Action::from_code(req.action)
        .map_err(|e| RelayError::BadRequest(e.to_string()))?;
    let user = parse_address(&req.user_address)?;

    if req
        .deadline
        .saturating_add(state.config.deadline_skew_tolerance_secs)
        < now_secs()
    {
        return Err(RelayError::DeadlineExpired);
    }

    let signer = recover_signer(user, req.action, req.deadline, &req.signature_hex)?;
    if signer != user {
        return Err(RelayError::InvalidSignature(
            "recovered signer does not match userAddress".to_string(),
        ));
    }

    let started = std::time::Instant::now();
    let delegation_state = state.delegation.get(user).await?;

    let tx_hash = if delegation_state.delegated {
        state
            .backend
            .submit_subsequent(user, action, req.deadline, sig_bytes(&req.signature_hex)?.as_slice())
            .await?
    } else {
        let auth = req.authorization.ok_or(RelayError::MissingAuthorization)?;
        let params = AuthorizationParams {
            chain_id: auth.chain_id,
            nonce: auth.nonce,
            r: parse_fixed_hex::<32>(&auth.r)?,
            s: parse_fixed_hex::<32>(&auth.s)?,
            y_parity: auth.y_parity,
        };
        state
            .backend
            .submit_first_use(
                user,
                action,
                req.deadline,
                sig_bytes(&req.signature_hex)?.as_slice(),
                params,
            )
            .await?
    };

    state.delegation.note_submitted(user);

    Ok(Json(RelayResponse {
        tx_hash: format!("0x{}", hex::encode(tx_hash.0)),
        duration_ms: started.elapsed().as_millis() as u64,
        delegated: true,
    }))
}

fn sig_bytes(signature_hex: &str) -> Result<Vec<u8>> {
    let trimmed = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    hex::decode(trimmed).map_err(|e| RelayError::BadRequest(format!("invalid hex: {e}")))
}

#[derive(Serialize)]
struct NonceResponse {
    nonce: u64,
}

async fn get_nonce(
    State(state): State<RelayState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse> {
    let address = parse_address(&address)?;
    let nonce = state.delegation.get(address).await?.execute_nonce;
    Ok(Json(NonceResponse { nonce }))
}

#[derive(Serialize)]
struct DelegatedResponse {
    delegated: bool,
}

async fn get_delegated(
    State(state): State<RelayState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse> {
    let address = parse_address(&address)?;
    let delegated = state.delegation.get(address).await?.delegated;
    Ok(Json(DelegatedResponse { delegated }))
}

#[derive(Serialize)]
struct HealthResponse {
    #[serde(rename = "walletBalance")]
    wallet_balance: String,
    #[serde(rename = "voteContract")]
    vote_contract: String,
    #[serde(rename = "delegationContract")]
    delegation_contract: String,
}

async fn get_health(State(state): State<RelayState>) -> Result<impl IntoResponse> {
    let balance = state.backend.wallet_balance().await?;
    Ok(Json(HealthResponse {
        wallet_balance: balance.to_string(),
        vote_contract: state.config.vote_contract_address.clone(),
        delegation_contract: format!("0x{}", hex::encode(state.config.delegation_contract_address)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> RelayState {
        let backend = Arc::new(MockBackend::new(1_000_000_000));
        RelayState::new(backend, RelayConfig::default())
    }

    #[tokio::test]
    async fn nonce_for_unknown_address_is_zero() {
        let state = test_state();
        let router = relay_routes().with_state(state);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/relay/nonce/0x1111111111111111111111111111111111111111")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn submit_rejects_expired_deadline() {
        let state = test_state();
        let router = relay_routes().with_state(state);

        let body = serde_json::json!({
            "userAddress": "0x1111111111111111111111111111111111111111",
            "action": 0,
            "deadline": 1,
            "signature": format!("0x{}", "11".repeat(65)),
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/relay")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_with_deadline_near_u64_max_does_not_panic() {
        let state = test_state();
        let router = relay_routes().with_state(state);

        let body = serde_json::json!({
            "userAddress": "0x1111111111111111111111111111111111111111",
            "action": 0,
            "deadline": u64::MAX - 1,
            "signature": format!("0x{}", "11".repeat(65)),
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/relay")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_configured_contracts() {
        let state = test_state();
        let router = relay_routes().with_state(state);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/relay/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
