//! Client-side core for the HR console: fetch record lists from the
//! server, filter and search them locally, validate form drafts, and
//! submit payloads that already passed validation.

use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{AllowanceId, CandidateId, DeductionId, Stage, TaxBracketId},
    error::ApiError,
    protocol::{
        Allowance, Candidate, Deduction, NewAllowance, NewCandidate, NewDeduction, NewTaxBracket,
        OnboardingMailRequest, TaxBracket,
    },
};
use tracing::warn;

pub mod debounce;
pub mod error;
pub mod filter;
pub mod session;
pub mod validate;

pub use error::ClientError;

use validate::{AllowanceDraft, CandidateDraft, DeductionDraft, TaxBracketDraft};

/// HTTP client for the HR server. Holds no record state of its own; the
/// per-screen state lives in [`session::ScreenSession`].
pub struct HrClient {
    http: Client,
    server_url: String,
}

impl HrClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }

    pub async fn list_allowances(&self) -> Result<Vec<Allowance>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/allowances", self.server_url))
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn create_allowance(&self, new: &NewAllowance) -> Result<Allowance, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/allowances", self.server_url))
            .json(new)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn update_allowance(
        &self,
        id: AllowanceId,
        edited: &NewAllowance,
    ) -> Result<Allowance, ClientError> {
        let response = self
            .http
            .put(format!("{}/api/allowances/{}", self.server_url, id.0))
            .json(edited)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn delete_allowance(&self, id: AllowanceId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/api/allowances/{}", self.server_url, id.0))
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    /// Validates the draft first; an invalid draft produces
    /// [`ClientError::Validation`] and no request is sent.
    pub async fn submit_allowance(&self, draft: &AllowanceDraft) -> Result<Allowance, ClientError> {
        let payload = draft.validate_all().map_err(ClientError::Validation)?;
        self.create_allowance(&payload).await
    }

    pub async fn list_deductions(&self) -> Result<Vec<Deduction>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/deductions", self.server_url))
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn create_deduction(&self, new: &NewDeduction) -> Result<Deduction, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/deductions", self.server_url))
            .json(new)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn update_deduction(
        &self,
        id: DeductionId,
        edited: &NewDeduction,
    ) -> Result<Deduction, ClientError> {
        let response = self
            .http
            .put(format!("{}/api/deductions/{}", self.server_url, id.0))
            .json(edited)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn delete_deduction(&self, id: DeductionId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/api/deductions/{}", self.server_url, id.0))
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    pub async fn submit_deduction(&self, draft: &DeductionDraft) -> Result<Deduction, ClientError> {
        let payload = draft.validate_all().map_err(ClientError::Validation)?;
        self.create_deduction(&payload).await
    }

    pub async fn list_tax_brackets(&self) -> Result<Vec<TaxBracket>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/federal-tax", self.server_url))
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn create_tax_bracket(&self, new: &NewTaxBracket) -> Result<TaxBracket, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/federal-tax", self.server_url))
            .json(new)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn update_tax_bracket(
        &self,
        id: TaxBracketId,
        edited: &NewTaxBracket,
    ) -> Result<TaxBracket, ClientError> {
        let response = self
            .http
            .put(format!("{}/api/federal-tax/{}", self.server_url, id.0))
            .json(edited)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn delete_tax_bracket(&self, id: TaxBracketId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/api/federal-tax/{}", self.server_url, id.0))
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    pub async fn submit_tax_bracket(
        &self,
        draft: &TaxBracketDraft,
    ) -> Result<TaxBracket, ClientError> {
        let payload = draft.validate_all().map_err(ClientError::Validation)?;
        self.create_tax_bracket(&payload).await
    }

    /// Lists candidates, optionally narrowed by stage on the server.
    pub async fn list_candidates(
        &self,
        stage: Option<Stage>,
    ) -> Result<Vec<Candidate>, ClientError> {
        let response = match stage {
            Some(stage) => {
                self.http
                    .get(format!("{}/api/onboarding/filter", self.server_url))
                    .query(&[("stage", stage.as_str())])
                    .send()
                    .await?
            }
            None => {
                self.http
                    .get(format!("{}/api/onboarding", self.server_url))
                    .send()
                    .await?
            }
        };
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn create_candidate(&self, new: &NewCandidate) -> Result<Candidate, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/onboarding", self.server_url))
            .json(new)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    pub async fn delete_candidate(&self, id: CandidateId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/api/onboarding/{}", self.server_url, id.0))
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    pub async fn submit_candidate(&self, draft: &CandidateDraft) -> Result<Candidate, ClientError> {
        let payload = draft.validate_all().map_err(ClientError::Validation)?;
        self.create_candidate(&payload).await
    }

    pub async fn send_onboarding_email(
        &self,
        request: &OnboardingMailRequest,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/api/onboarding/send-email", self.server_url))
            .json(request)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }
}

/// Maps non-success responses to [`ClientError`], pulling the message out
/// of the wire error body when the server sent one.
async fn expect_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(api_error) => api_error.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    warn!(status = status.as_u16(), %message, "server rejected request");

    if status == StatusCode::CONFLICT {
        return Err(ClientError::Conflict(message));
    }
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
