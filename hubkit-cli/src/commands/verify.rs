//! Verify command - check a credential against a hub configuration

use anyhow::Result;
use async_trait::async_trait;
use hubkit_lib::driver::DriverResult;
use hubkit_lib::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ui;

/// Driver that accepts every write without storing anything.
struct DryRunDriver;

#[async_trait]
impl Driver for DryRunDriver {
    fn read_url_prefix(&self) -> String {
        "dry-run://".to_string()
    }

    async fn perform_write(&self, descriptor: WriteDescriptor) -> DriverResult<String> {
        tracing::debug!(?descriptor, "dry-run write");
        Ok(format!("{}{}", self.read_url_prefix(), descriptor.storage_key()))
    }

    async fn list_files(
        &self,
        _storage_top_level: &str,
        _page: Option<&str>,
    ) -> DriverResult<ListFilesResult> {
        Ok(ListFilesResult::default())
    }
}

/// Returns whether the credential was accepted.
pub async fn run(
    config_path: &str,
    address: &str,
    header: &str,
    path: Option<&str>,
    floor: Option<i64>,
    verbose: bool,
) -> Result<bool> {
    let config = HubConfig::from_file(config_path)?;
    let server = HubServer::new(config, Arc::new(DryRunDriver))?;
    if verbose {
        let config = server.config();
        ui::info(&format!("Loaded hub config for {}", config.server_name));
        if let Some(limit) = config.max_file_upload_size_bytes() {
            ui::info(&format!("Uploads capped at {} bytes", limit));
        }
    }
    if let Some(floor) = floor {
        server.revocations().bump(address, floor);
    }

    let headers: Headers = HashMap::from([
        ("authorization".to_string(), header.to_string()),
        ("content-length".to_string(), "0".to_string()),
    ]);

    ui::header("Credential Check");
    ui::key_value("Address", address);

    let outcome = match path {
        Some(path) => server
            .handle_request(address, path, &headers, Box::new(tokio::io::empty()))
            .await
            .map(Some),
        None => server.validate(address, &headers).map(|_| None),
    };

    match outcome {
        Ok(url) => {
            if let Ok(Authenticator::Legacy(_)) = Authenticator::from_header(header) {
                ui::warning("Legacy token: it carries no scopes and ignores revocation floors");
            }
            if let Some(url) = url {
                ui::key_value("Would write", &url);
            }
            ui::success("Credential accepted");
            Ok(true)
        }
        Err(err) => {
            ui::key_value("Error code", &format!("{:?}", err.code()));
            ui::error(&err.to_string());
            Ok(false)
        }
    }
}
