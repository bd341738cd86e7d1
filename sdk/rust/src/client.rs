use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitForm {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    /// Base64 file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub message: String,
    pub submission_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPage {
    pub success: bool,
    pub count: usize,
    pub category: String,
    pub projects: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub submissions: Vec<serde_json::Value>,
    pub count: usize,
}

pub struct ContactClient {
    client: Client,
    base_url: String,
}

impl ContactClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send a contact form. With an idempotency key, retries of the same form
    /// return the original submission id.
    pub async fn submit(
        &self,
        form: &SubmitForm,
        idempotency_key: Option<&str>,
    ) -> Result<SubmitReceipt, Box<dyn std::error::Error>> {
        let resp = self.submit_raw(form, idempotency_key).await?;
        decode(resp).await
    }

    /// Send a contact form and hand back the raw response.
    pub async fn submit_raw(
        &self,
        form: &SubmitForm,
        idempotency_key: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let mut req = self
            .client
            .post(format!("{}/api/submit", self.base_url))
            .json(form);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        req.send().await
    }

    /// Published projects, optionally for one category.
    pub async fn projects(&self, category: Option<&str>) -> Result<ProjectPage, Box<dyn std::error::Error>> {
        let mut req = self.client.get(format!("{}/api/projects", self.base_url));
        if let Some(category) = category {
            req = req.query(&[("category", category)]);
        }
        decode(req.send().await?).await
    }

    pub async fn submissions(&self) -> Result<SubmissionPage, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/submissions", self.base_url))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Box<dyn std::error::Error>> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(format!("Service returned error status {}: {}", status, text).into());
    }

    Ok(serde_json::from_str::<T>(&text)?)
}
