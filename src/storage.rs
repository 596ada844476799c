use crate::config::Config;

/// Opaque blob-store collaborator: put/get/delete by path over an
/// authenticated HTTP API. Audio and image files live here; the database
/// only keeps their public URLs.
#[derive(Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
    public_base_url: String,
}

#[derive(Debug)]
pub enum BlobError {
    Transport(reqwest::Error),
    Status(u16),
}

impl std::fmt::Display for BlobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlobError::Transport(e) => write!(f, "blob transport error: {}", e),
            BlobError::Status(code) => write!(f, "blob store returned status {}", code),
        }
    }
}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        BlobError::Transport(e)
    }
}

impl BlobStore {
    pub fn new(config: &Config) -> Self {
        BlobStore {
            http: reqwest::Client::new(),
            base_url: config.blob_store_url.trim_end_matches('/').to_string(),
            token: config.blob_store_token.clone(),
            public_base_url: config.blob_public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL clients use to fetch the object.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }

    pub async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(self.public_url(path))
    }

    pub async fn get(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self.http.delete(&url).bearer_auth(&self.token).send().await?;

        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
