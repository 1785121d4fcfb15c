//! Ledger node for the journal program.
//!
//! Verifies owner signatures on submissions, executes them through
//! [`JournalProgram`](jrnl_ledger::JournalProgram), and serves entry reads
//! over the JSON/HTTP protocol spoken by
//! [`RemoteLedgerClient`](jrnl_ledger::RemoteLedgerClient).

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::LedgerNode;
pub use state::NodeState;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use jrnl_crypto::SigningKey;
    use jrnl_ledger::wire::{endpoints, ErrorBody, SubmitPayload, SubmitRequest};
    use jrnl_ledger::{Instruction, JournalProgram, DEFAULT_PROGRAM_ID};
    use jrnl_types::{Address, Commitment, Identity};
    use tower::util::ServiceExt;

    fn app() -> axum::Router {
        let node = NodeState::new();
        node.deploy(JournalProgram::with_samples(DEFAULT_PROGRAM_ID))
            .unwrap();
        router::build_router(node)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri(endpoints::HEALTH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn entries_endpoint_lists_samples() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "{}?commitment=finalized",
                        endpoints::entries(&DEFAULT_PROGRAM_ID)
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let records: Vec<jrnl_ledger::wire::EntryRecord> = body_json(response).await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn program_endpoint_reports_deployment() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri(endpoints::program(&DEFAULT_PROGRAM_ID))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let info: jrnl_ledger::ProgramInfo = body_json(response).await;
        assert_eq!(info.program, DEFAULT_PROGRAM_ID);
        assert_eq!(info.accounts, 2);

        let other = Identity::from_bytes([9; 32]);
        let response = app()
            .oneshot(
                Request::builder()
                    .uri(endpoints::entries(&other))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.missing_program, Some(other));
        assert_eq!(body.code, None);
    }

    #[tokio::test]
    async fn missing_entry_is_404() {
        let uri = endpoints::entry(&DEFAULT_PROGRAM_ID, &Address::from_bytes([5; 32]));
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_address_is_rejected() {
        let uri = format!("/v1/programs/{DEFAULT_PROGRAM_ID}/entries/not-hex");
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forged_submission_carries_error_code() {
        let owner = Identity::from_bytes([3; 32]);
        let payload = SubmitPayload {
            program: DEFAULT_PROGRAM_ID,
            owner,
            address: Address::from_bytes([4; 32]),
            instruction: Instruction::create("Day 1", "Hello"),
            nonce: "n".into(),
        };
        let request = SubmitRequest {
            signature: SigningKey::generate().sign(&payload.signing_bytes().unwrap()),
            payload,
            commitment: Commitment::default(),
        };
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(endpoints::submit(&DEFAULT_PROGRAM_ID))
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, Some(3));
        assert_eq!(body.missing_program, None);
    }
}
