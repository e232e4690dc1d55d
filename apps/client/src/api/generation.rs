use tracing::info;

use crate::api::BackendClient;
use crate::errors::ClientError;
use crate::gateway::ApiRequest;
use crate::models::generation::{CoverLetterDraft, GenerationRequest, ResumeDraft, TemplateStyle};

const GENERATE_RESUME_PATH: &str = "/profiles/profile/generate_resume/";
const GENERATE_COVER_LETTER_PATH: &str = "/profiles/profile/generate_cover_letter/";

impl GenerationRequest {
    pub fn new(job_description: impl Into<String>, template_style: TemplateStyle) -> Self {
        Self {
            job_description: job_description.into(),
            template_style,
        }
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.job_description.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please paste a job description.".to_string(),
            ));
        }
        Ok(())
    }
}

impl BackendClient {
    pub async fn generate_resume(
        &self,
        request: &GenerationRequest,
    ) -> Result<ResumeDraft, ClientError> {
        request.validate()?;
        let draft: ResumeDraft = self
            .send_json(GENERATE_RESUME_PATH, ApiRequest::post(), request)
            .await?;
        info!(
            "Generated resume draft ({} template, fit score {:?})",
            request.template_style, draft.fit_score
        );
        Ok(draft)
    }

    pub async fn generate_cover_letter(
        &self,
        request: &GenerationRequest,
    ) -> Result<CoverLetterDraft, ClientError> {
        request.validate()?;
        let draft: CoverLetterDraft = self
            .send_json(GENERATE_COVER_LETTER_PATH, ApiRequest::post(), request)
            .await?;
        info!(
            "Generated cover letter draft with {} paragraphs",
            draft.body_paragraphs.len()
        );
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::api::testing::client;
    use crate::gateway::testing::{reply, ScriptedTransport};
    use crate::gateway::RequestBody;

    use super::*;

    #[tokio::test]
    async fn test_blank_job_description_makes_no_call() {
        let transport = ScriptedTransport::new(vec![]);

        let err = client(&transport)
            .generate_resume(&GenerationRequest::new("   \n", TemplateStyle::Modern))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Please paste a job description.");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_resume_body_and_result() {
        let transport = ScriptedTransport::new(vec![reply(
            StatusCode::OK,
            r#"{"headline": "Rust Engineer", "skills": ["Rust", "Tokio"], "fit_score": 91}"#,
        )]);

        let draft = client(&transport)
            .generate_resume(&GenerationRequest::new(
                "Build async services in Rust",
                TemplateStyle::Classic,
            ))
            .await
            .unwrap();

        assert_eq!(draft.skills, ["Rust", "Tokio"]);
        let call = &transport.calls()[0];
        assert_eq!(call.url, "http://api.test/profiles/profile/generate_resume/");
        let RequestBody::Json(body) = &call.request.body else {
            panic!("expected JSON body");
        };
        let body: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(body["job_description"], "Build async services in Rust");
        assert_eq!(body["template_style"], "classic");
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_backend_text() {
        let transport = ScriptedTransport::new(vec![reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "AI provider unavailable",
        )]);

        let err = client(&transport)
            .generate_cover_letter(&GenerationRequest::new("jd", TemplateStyle::Modern))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "AI provider unavailable");
        assert_eq!(
            transport.calls()[0].url,
            "http://api.test/profiles/profile/generate_cover_letter/"
        );
    }

    #[tokio::test]
    async fn test_cover_letter_after_refresh() {
        let transport = ScriptedTransport::new(vec![
            reply(StatusCode::UNAUTHORIZED, ""),
            reply(StatusCode::OK, "{}"),
            reply(
                StatusCode::OK,
                r#"{"subject": "Application", "body_paragraphs": ["One", "Two"]}"#,
            ),
        ]);

        let draft = client(&transport)
            .generate_cover_letter(&GenerationRequest::new("jd", TemplateStyle::Creative))
            .await
            .unwrap();

        assert_eq!(draft.body_paragraphs.len(), 2);
        assert_eq!(transport.calls().len(), 3);
    }
}
