//! Package records: what the server offers, what was downloaded, what is deployed

use hotswap_errors::NetworkError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One deployed package generation.
///
/// This is the on-disk record stored in the current and previous slots. The
/// field names are camelCase so the record stays readable by the native side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    /// Version of the native binary this package targets
    pub app_version: String,
    /// Update channel the package came from
    pub deployment_key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_mandatory: bool,
    /// Content hash; also the generation directory name
    pub package_hash: String,
    #[serde(default)]
    pub package_size: u64,
    /// Directory holding this generation's extracted file tree
    pub local_path: PathBuf,
    /// Filled from the native layer on read, persisted as `false`
    #[serde(default)]
    pub is_first_run: bool,
    /// Filled from the native layer on read, persisted as `false`
    #[serde(default)]
    pub failed_install: bool,
}

impl PackageMetadata {
    /// Build the record for a freshly deployed generation.
    #[must_use]
    pub fn from_remote(remote: &RemotePackage, local_path: PathBuf) -> Self {
        Self {
            app_version: remote.app_version.clone(),
            deployment_key: remote.deployment_key.clone(),
            label: remote.label.clone(),
            description: remote.description.clone(),
            is_mandatory: remote.is_mandatory,
            package_hash: remote.package_hash.clone(),
            package_size: remote.package_size,
            local_path,
            is_first_run: false,
            failed_install: false,
        }
    }
}

/// Update check payload returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckResponse {
    pub is_available: bool,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub package_hash: String,
    #[serde(default)]
    pub package_size: u64,
    #[serde(default, rename = "downloadURL")]
    pub download_url: String,
    /// Set when the only available update targets a newer binary
    #[serde(default)]
    pub update_app_version: bool,
}

impl UpdateCheckResponse {
    /// Response meaning "nothing to do".
    #[must_use]
    pub fn not_available(app_version: impl Into<String>) -> Self {
        Self {
            is_available: false,
            app_version: app_version.into(),
            is_mandatory: false,
            label: String::new(),
            description: String::new(),
            package_hash: String::new(),
            package_size: 0,
            download_url: String::new(),
            update_app_version: false,
        }
    }

    /// Reject an offer that cannot be acted on.
    ///
    /// An available package must name its hash and where to fetch it. Responses
    /// that offer nothing installable are accepted as they are.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::MalformedResponse` naming the missing field.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !self.is_available || self.update_app_version {
            return Ok(());
        }
        let missing = if self.package_hash.trim().is_empty() {
            "packageHash"
        } else if self.download_url.trim().is_empty() {
            "downloadURL"
        } else {
            return Ok(());
        };
        Err(NetworkError::MalformedResponse {
            message: format!("available update has no {missing}"),
        })
    }

    /// Whether this response offers a package installable on the running binary.
    #[must_use]
    pub fn is_applicable_to(&self, binary_app_version: &str) -> bool {
        self.is_available && !self.update_app_version && self.app_version == binary_app_version
    }

    /// Convert into a remote package for the given deployment key.
    #[must_use]
    pub fn into_remote(self, deployment_key: impl Into<String>) -> RemotePackage {
        RemotePackage {
            app_version: self.app_version,
            deployment_key: deployment_key.into(),
            label: self.label,
            description: self.description,
            is_mandatory: self.is_mandatory,
            package_hash: self.package_hash,
            package_size: self.package_size,
            download_url: self.download_url,
        }
    }
}

/// A package offered by the server and not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePackage {
    pub app_version: String,
    pub deployment_key: String,
    pub label: String,
    pub description: String,
    pub is_mandatory: bool,
    pub package_hash: String,
    pub package_size: u64,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

/// A remote package whose archive is on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPackage {
    pub remote: RemotePackage,
    pub archive_path: PathBuf,
}

impl DownloadedPackage {
    #[must_use]
    pub fn package_hash(&self) -> &str {
        &self.remote.package_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_json_uses_native_field_names() {
        let meta = PackageMetadata {
            app_version: "1.0.0".into(),
            deployment_key: "key".into(),
            label: "v3".into(),
            description: String::new(),
            is_mandatory: true,
            package_hash: "abc".into(),
            package_size: 42,
            local_path: PathBuf::from("/data/codepush/deploy/versions/abc"),
            is_first_run: false,
            failed_install: false,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["packageHash"], "abc");
        assert_eq!(json["isMandatory"], true);
        assert_eq!(json["localPath"], "/data/codepush/deploy/versions/abc");
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn response_parses_server_payload() {
        let body = r#"{
            "downloadURL": "https://cdn.example.com/p.zip",
            "isAvailable": true,
            "isMandatory": false,
            "appVersion": "1.0.0",
            "packageHash": "h1",
            "label": "v1",
            "packageSize": 1024
        }"#;
        let response: UpdateCheckResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_applicable_to("1.0.0"));
        assert!(!response.is_applicable_to("2.0.0"));
        let remote = response.into_remote("staging");
        assert_eq!(remote.download_url, "https://cdn.example.com/p.zip");
        assert_eq!(remote.deployment_key, "staging");
    }

    #[test]
    fn available_offer_needs_hash_and_url() {
        let body = r#"{ "isAvailable": true, "appVersion": "1.0.0", "packageHash": "h1" }"#;
        let response: UpdateCheckResponse = serde_json::from_str(body).unwrap();
        let err = response.validate().unwrap_err();
        assert!(matches!(err, NetworkError::MalformedResponse { ref message } if message.contains("downloadURL")));

        let response: UpdateCheckResponse =
            serde_json::from_str(r#"{ "isAvailable": true }"#).unwrap();
        assert!(response.validate().is_err());

        assert!(UpdateCheckResponse::not_available("1.0.0").validate().is_ok());
        let mut binary_only = UpdateCheckResponse::not_available("2.0.0");
        binary_only.is_available = true;
        binary_only.update_app_version = true;
        assert!(binary_only.validate().is_ok());
    }

    #[test]
    fn binary_update_is_not_applicable() {
        let mut response = UpdateCheckResponse::not_available("2.0.0");
        assert!(!response.is_applicable_to("2.0.0"));
        response.is_available = true;
        response.update_app_version = true;
        assert!(!response.is_applicable_to("2.0.0"));
    }
}
