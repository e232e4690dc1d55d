use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::api::auth::ONBOARDING_PATH;
use crate::api::BackendClient;
use crate::errors::ClientError;
use crate::gateway::{ApiRequest, MultipartForm};
use crate::models::profile::{
    Achievement, Certification, Education, Experience, OnboardingStatus, ParsedResume, Profile,
    ProfileFields, Skill,
};

const PROFILE_PATH: &str = "/profiles/profile/me/";
const UPDATE_PROFILE_PATH: &str = "/profiles/profile/update_me/";
const PARSE_RESUME_PATH: &str = "/profiles/profile/parse_resume/";
const ONBOARDING_SUBMIT_PATH: &str = "/profiles/profile/onboarding_submit/";
const RESUME_FIELD: &str = "resume_file";

/// A resume file held in memory for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| RESUME_FIELD.to_string());
        Ok(Self {
            mime: mime_for(&file_name).map(str::to_string),
            file_name,
            data: Bytes::from(data),
        })
    }
}

fn mime_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Profile collections editable one entry at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Skills,
    Experiences,
    Educations,
    Certifications,
    Achievements,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Skills => "skills",
            Section::Experiences => "experiences",
            Section::Educations => "educations",
            Section::Certifications => "certifications",
            Section::Achievements => "achievements",
        }
    }

    fn collection_path(&self) -> String {
        format!("/profiles/{}/", self.as_str())
    }

    fn entry_path(&self, id: i64) -> String {
        format!("/profiles/{}/{id}/", self.as_str())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skills" | "skill" => Ok(Section::Skills),
            "experiences" | "experience" => Ok(Section::Experiences),
            "educations" | "education" => Ok(Section::Educations),
            "certifications" | "certification" => Ok(Section::Certifications),
            "achievements" | "achievement" => Ok(Section::Achievements),
            other => Err(format!("unknown profile section '{other}'")),
        }
    }
}

/// Everything collected by the onboarding flow, submitted in one request.
#[derive(Debug, Clone, Default)]
pub struct OnboardingSubmission {
    pub profile: ProfileFields,
    pub skills: Vec<Skill>,
    pub experiences: Vec<Experience>,
    pub educations: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub achievements: Vec<Achievement>,
    pub resume_file: Option<UploadFile>,
}

impl OnboardingSubmission {
    /// Each field is a JSON document in its own form part.
    fn to_form(&self) -> Result<MultipartForm, ClientError> {
        let mut form = MultipartForm::new()
            .text("profile", serde_json::to_string(&self.profile)?)
            .text("skills", serde_json::to_string(&self.skills)?)
            .text("experiences", serde_json::to_string(&self.experiences)?)
            .text("educations", serde_json::to_string(&self.educations)?)
            .text("certifications", serde_json::to_string(&self.certifications)?)
            .text("achievements", serde_json::to_string(&self.achievements)?);
        if let Some(file) = &self.resume_file {
            form = attach_resume(form, file);
        }
        Ok(form)
    }
}

fn attach_resume(form: MultipartForm, file: &UploadFile) -> MultipartForm {
    form.file(
        RESUME_FIELD,
        file.file_name.clone(),
        file.mime.clone(),
        file.data.clone(),
    )
}

impl BackendClient {
    pub async fn profile(&self) -> Result<Profile, ClientError> {
        self.get_json(PROFILE_PATH).await
    }

    /// Returns the updated profile fields (without nested collections).
    pub async fn update_profile(&self, fields: &ProfileFields) -> Result<Value, ClientError> {
        self.send_json(UPDATE_PROFILE_PATH, ApiRequest::patch(), fields)
            .await
    }

    pub async fn upload_resume(&self, file: &UploadFile) -> Result<Value, ClientError> {
        let request = ApiRequest::patch().multipart(attach_resume(MultipartForm::new(), file));
        let response = self.gateway().fetch(UPDATE_PROFILE_PATH, &request).await?;
        crate::api::decode(response)
    }

    pub async fn onboarding(&self) -> Result<OnboardingStatus, ClientError> {
        self.get_json(ONBOARDING_PATH).await
    }

    pub async fn parse_resume(&self, file: &UploadFile) -> Result<ParsedResume, ClientError> {
        let request = ApiRequest::post().multipart(attach_resume(MultipartForm::new(), file));
        let response = self.gateway().fetch(PARSE_RESUME_PATH, &request).await?;
        crate::api::decode(response)
    }

    pub async fn submit_onboarding(
        &self,
        submission: &OnboardingSubmission,
    ) -> Result<Value, ClientError> {
        let request = ApiRequest::post().multipart(submission.to_form()?);
        let response = self.gateway().fetch(ONBOARDING_SUBMIT_PATH, &request).await?;
        crate::api::decode(response)
    }

    /// Creates an entry when `id` is absent or not positive, else patches it.
    pub async fn save_entry<T: Serialize + ?Sized>(
        &self,
        section: Section,
        id: Option<i64>,
        payload: &T,
    ) -> Result<Value, ClientError> {
        match id.filter(|id| *id > 0) {
            Some(id) => {
                self.send_json(&section.entry_path(id), ApiRequest::patch(), payload)
                    .await
            }
            None => {
                self.send_json(&section.collection_path(), ApiRequest::post(), payload)
                    .await
            }
        }
    }

    pub async fn delete_entry(&self, section: Section, id: i64) -> Result<(), ClientError> {
        self.delete(&section.entry_path(id)).await
    }
}
