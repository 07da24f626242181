use std::{path::Path, sync::Arc};

use anyhow::Context;
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde::Deserialize;

use crate::http_client::HttpClient;

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Publishes the watcher function bundle to the IPFS node and returns its
/// CID. Single attempt, registration has no retry policy.
pub async fn publish_bundle(
    ipfs_http_client: Arc<HttpClient>,
    bundle_path: &Path,
) -> anyhow::Result<String> {
    let contents = tokio::fs::read(bundle_path).await.context(format!(
        "could not read function bundle at {}",
        bundle_path.display()
    ))?;
    let file_name = bundle_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "bundle".to_owned());
    let form = Form::new().part("file", Part::bytes(contents).file_name(file_name));

    let response = ipfs_http_client
        .request(Method::POST, "/api/v0/add")
        .await?
        .multipart(form)
        .send()
        .await
        .context("could not upload function bundle to ipfs")?
        .error_for_status()
        .context("ipfs add request was rejected")?;

    let parsed = response
        .json::<AddResponse>()
        .await
        .context("could not deserialize ipfs add response")?;
    Ok(parsed.hash)
}
