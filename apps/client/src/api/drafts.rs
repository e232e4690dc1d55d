use crate::api::BackendClient;
use crate::errors::ClientError;
use crate::gateway::ApiRequest;
use crate::models::draft::{NewDraft, SavedDraft};

const DRAFTS_PATH: &str = "/drafts/drafts/";

fn draft_path(id: i64) -> String {
    format!("{DRAFTS_PATH}{id}/")
}

impl BackendClient {
    pub async fn list_drafts(&self) -> Result<Vec<SavedDraft>, ClientError> {
        self.get_json(DRAFTS_PATH).await
    }

    pub async fn get_draft(&self, id: i64) -> Result<SavedDraft, ClientError> {
        self.get_json(&draft_path(id)).await
    }

    pub async fn save_draft(&self, draft: &NewDraft) -> Result<SavedDraft, ClientError> {
        self.send_json(DRAFTS_PATH, ApiRequest::post(), draft).await
    }

    pub async fn delete_draft(&self, id: i64) -> Result<(), ClientError> {
        self.delete(&draft_path(id)).await
    }
}
