use aws_config::Region;
use aws_sdk_s3::config::{Credentials, SharedCredentialsProvider};
use aws_sdk_s3::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// S3-compatible object storage holding uploaded documents.
#[derive(Debug, Deserialize, Clone)]
pub struct MinIOSettings {
    pub endpoint: String,
    pub access_key: SecretString,
    pub secret_key: SecretString,
    pub bucket_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl MinIOSettings {
    pub fn s3_client(&self) -> Client {
        let credentials = Credentials::new(
            self.access_key.expose_secret(),
            self.secret_key.expose_secret(),
            None,
            None,
            "medlm-minio",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .endpoint_url(&self.endpoint)
            .region(Region::new(self.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            // MinIO serves buckets under the path, not as subdomains
            .force_path_style(true)
            .build();

        Client::from_conf(config)
    }
}
