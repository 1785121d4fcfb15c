use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jrnl_crypto::SigningKey;
use jrnl_types::{Address, Commitment, ConfirmationToken, Entry, Identity};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Instruction;
use crate::program::ProgramError;
use crate::traits::LedgerClient;
use crate::wire::{
    endpoints, EntryRecord, ErrorBody, HealthResponse, ProgramInfo, SubmitPayload,
    SubmitRequest, SubmitResponse,
};

/// Connection settings for a [`RemoteLedgerClient`].
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Base URL of the ledger node, e.g. `http://127.0.0.1:8899`.
    pub endpoint: String,
    pub program: Identity,
    pub commitment: Commitment,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(endpoint: impl Into<String>, program: Identity) -> Self {
        Self {
            endpoint: endpoint.into(),
            program,
            commitment: Commitment::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Ledger client for a live ledger node, over JSON/HTTP.
///
/// Every submission is signed by the configured [`SigningKey`]; the node
/// rejects payloads whose signature does not verify against the owner.
#[derive(Clone)]
pub struct RemoteLedgerClient {
    base: String,
    program: Identity,
    commitment: Commitment,
    client: Client,
    signer: Option<Arc<SigningKey>>,
}

impl RemoteLedgerClient {
    pub fn new(config: RemoteConfig) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("jrnl-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LedgerError::TransportUnavailable(e.to_string()))?;
        Ok(Self {
            base: config.endpoint.trim_end_matches('/').to_string(),
            program: config.program,
            commitment: config.commitment,
            client,
            signer: None,
        })
    }

    /// Sign submissions with `signer`. Without one, `submit` fails
    /// [`LedgerError::MissingSigner`].
    pub fn with_signer(mut self, signer: SigningKey) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    /// Ask the node for its health.
    pub async fn health(&self) -> LedgerResult<HealthResponse> {
        let url = format!("{}{}", self.base, endpoints::HEALTH);
        let resp = self.client.get(&url).send().await.map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        resp.json::<HealthResponse>().await.map_err(transport_error)
    }
}

#[async_trait]
impl LedgerClient for RemoteLedgerClient {
    fn program(&self) -> Identity {
        self.program
    }

    fn backend(&self) -> &'static str {
        "remote"
    }

    async fn submit(
        &self,
        owner: &Identity,
        address: &Address,
        instruction: &Instruction,
    ) -> LedgerResult<ConfirmationToken> {
        let signer = self.signer.as_ref().ok_or(LedgerError::MissingSigner)?;
        let payload = SubmitPayload {
            program: self.program,
            owner: *owner,
            address: *address,
            instruction: instruction.clone(),
            nonce: uuid::Uuid::now_v7().to_string(),
        };
        let bytes = payload
            .signing_bytes()
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let request = SubmitRequest {
            signature: signer.sign(&bytes),
            payload,
            commitment: self.commitment,
        };

        let url = format!("{}{}", self.base, endpoints::submit(&self.program));
        debug!(%url, op = %instruction.kind(), "submitting");
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            let err = rejection(resp).await;
            warn!(op = %instruction.kind(), address = %address.short_hex(), error = %err, "submission rejected");
            return Err(err);
        }
        let body = resp
            .json::<SubmitResponse>()
            .await
            .map_err(transport_error)?;
        info!(op = %instruction.kind(), address = %address.short_hex(), token = %body.token.short(), "transaction confirmed");
        Ok(body.token)
    }

    async fn fetch_one(&self, address: &Address) -> LedgerResult<Option<Entry>> {
        let url = format!("{}{}", self.base, endpoints::entry(&self.program, address));
        let resp = self
            .client
            .get(&url)
            .query(&[("commitment", self.commitment.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return match rejection(resp).await {
                err @ LedgerError::ProgramNotDeployed(_) => Err(err),
                _ if status == StatusCode::NOT_FOUND => Ok(None),
                err => Err(err),
            };
        }
        let record = resp.json::<EntryRecord>().await.map_err(transport_error)?;
        Ok(Some(record.entry))
    }

    async fn fetch_all(&self, program: &Identity) -> LedgerResult<Vec<(Address, Entry)>> {
        let url = format!("{}{}", self.base, endpoints::entries(program));
        let resp = self
            .client
            .get(&url)
            .query(&[("commitment", self.commitment.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        let records = resp
            .json::<Vec<EntryRecord>>()
            .await
            .map_err(transport_error)?;
        Ok(records.into_iter().map(|r| (r.address, r.entry)).collect())
    }

    async fn program_deployed(&self, program: &Identity) -> LedgerResult<bool> {
        let url = format!("{}{}", self.base, endpoints::program(program));
        let resp = self.client.get(&url).send().await.map_err(transport_error)?;
        if !resp.status().is_success() {
            return match rejection(resp).await {
                LedgerError::ProgramNotDeployed(_) => Ok(false),
                err => Err(err),
            };
        }
        let info = resp.json::<ProgramInfo>().await.map_err(transport_error)?;
        debug!(program = %info.program.short_id(), accounts = info.accounts, "program deployed");
        Ok(true)
    }
}

fn transport_error(err: reqwest::Error) -> LedgerError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        LedgerError::TransportUnavailable(err.to_string())
    } else if err.is_decode() {
        LedgerError::Serialization(err.to_string())
    } else {
        LedgerError::SubmissionFailed(err.to_string())
    }
}

/// Decode a non-success response into the matching error.
async fn rejection(resp: Response) -> LedgerError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).ok();
    if let Some(program) = body.as_ref().and_then(|b| b.missing_program) {
        return LedgerError::ProgramNotDeployed(program);
    }
    if let Some(err) = body
        .as_ref()
        .and_then(|b| b.code)
        .and_then(ProgramError::from_code)
    {
        return LedgerError::Rejected(err);
    }
    LedgerError::Remote {
        status: status.as_u16(),
        message: body.map(|b| b.message).unwrap_or(text),
    }
}
