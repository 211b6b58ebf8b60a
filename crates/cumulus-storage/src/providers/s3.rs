//! AWS S3 backend using the official AWS SDK.
//!
//! Works with AWS S3 and any S3-compatible service reachable through a custom
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use bytes::Bytes;

use super::{Backend, Connector};
use crate::types::{ListingPage, ObjectLocation, PresignedUrl, PutOptions, Region, StoredObject};
use crate::{Error, Result, TRACING_TARGET_BACKEND};

/// S3 client bound to one region.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    region: Region,
}

impl S3Backend {
    /// Wraps an already configured SDK client.
    pub fn new(client: Client, region: impl Into<Region>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Returns the underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl Backend for S3Backend {
    fn region(&self) -> &Region {
        &self.region
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Bytes,
        options: PutOptions,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(payload))
            .set_content_type(options.content_type);

        if options.encrypted {
            request = request.server_side_encryption(ServerSideEncryption::AwsKms);
        }

        // The receiving store only accepts relayed bodies with a declared length.
        if let Some(length) = options.content_length {
            let length = i64::try_from(length)
                .map_err(|_| Error::backend("put", format!("content length {length} too large")))?;
            request = request.content_length(length);
        }

        request.send().await.map_err(|e| from_sdk("put", e))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    Error::not_found(bucket, key)
                } else {
                    from_sdk("get", e)
                }
            })?;

        let content_length = output
            .content_length()
            .and_then(|length| u64::try_from(length).ok());
        let content_type = output.content_type().map(str::to_owned);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::backend_with_source("get", e))?
            .into_bytes();

        Ok(StoredObject {
            key: key.to_owned(),
            data,
            content_length,
            content_type,
        })
    }

    async fn copy(&self, bucket: &str, key: &str, source: &ObjectLocation) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(source.copy_source())
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| from_sdk("copy", e))?;
        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token.map(str::to_owned))
            .send()
            .await
            .map_err(|e| from_sdk("list", e))?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key();
                if key.is_none() {
                    tracing::debug!(
                        target: TRACING_TARGET_BACKEND,
                        bucket,
                        prefix,
                        "listed object without a key, skipping"
                    );
                }
                key.map(str::to_owned)
            })
            .collect();

        Ok(ListingPage {
            keys,
            is_truncated: output.is_truncated().unwrap_or(false),
            continuation_token: output.next_continuation_token().map(str::to_owned),
        })
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl> {
        let config =
            PresigningConfig::expires_in(expires_in).map_err(|e| Error::presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| Error::presign(DisplayErrorContext(&e).to_string()))?;

        Ok(PresignedUrl::new(request.uri(), expires_in))
    }
}

/// Creates [`S3Backend`] handles from a shared [`SdkConfig`].
///
/// Credentials and retry settings come from the shared configuration; only
/// the region differs between the handles it creates.
#[derive(Debug, Clone)]
pub struct S3Connector {
    sdk_config: SdkConfig,
    endpoint: Option<String>,
}

impl S3Connector {
    /// Creates a connector from a loaded SDK configuration.
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self {
            sdk_config,
            endpoint: None,
        }
    }

    /// Loads the SDK configuration from the environment (credentials chain,
    /// profile, `AWS_REGION`), using `region` as the fallback region.
    pub async fn from_env(region: &Region) -> Self {
        let region_provider = aws_config::meta::region::RegionProviderChain::default_provider()
            .or_else(aws_sdk_s3::config::Region::new(region.to_string()));
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        Self::new(sdk_config)
    }

    /// Routes every request to a custom endpoint using path-style addressing
    /// (MinIO, LocalStack and other S3-compatible services).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Region the shared configuration resolved to, if any.
    pub fn default_region(&self) -> Option<Region> {
        self.sdk_config.region().map(|r| Region::new(r.as_ref()))
    }
}

impl Connector for S3Connector {
    fn connect(&self, region: &Region) -> Arc<dyn Backend> {
        let mut builder = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_s3::config::Region::new(region.to_string()));

        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!(
            target: TRACING_TARGET_BACKEND,
            region = %region,
            endpoint = ?self.endpoint,
            "created s3 client"
        );

        Arc::new(S3Backend::new(Client::from_conf(builder.build()), region.clone()))
    }
}

/// Converts an SDK failure into a crate [`Error`], keeping the service's
/// error code and message intact.
fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_owned(),
        _ => DisplayErrorContext(&err).to_string(),
    };

    Error::Backend {
        operation,
        message,
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::copy_object::CopyObjectError;
    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::types::Object;
    use aws_sdk_s3::types::error::NoSuchKey;
    use aws_smithy_mocks::{mock, mock_client};

    use super::*;

    #[tokio::test]
    async fn get_maps_no_such_key_to_not_found() {
        let rule = mock!(Client::get_object)
            .then_error(|| GetObjectError::NoSuchKey(NoSuchKey::builder().build()));
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let err = backend.get("documents", "missing.json").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object 'missing.json' not found in bucket 'documents'");
    }

    #[tokio::test]
    async fn get_reads_body_and_metadata() {
        let rule = mock!(Client::get_object)
            .match_requests(|req| {
                req.bucket() == Some("documents") && req.key() == Some("case/1/submission.json")
            })
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(b"{}"))
                    .content_length(2)
                    .content_type("application/json")
                    .build()
            });
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let object = backend
            .get("documents", "case/1/submission.json")
            .await
            .unwrap();
        assert_eq!(object.key, "case/1/submission.json");
        assert_eq!(object.as_bytes(), b"{}");
        assert_eq!(object.content_length, Some(2));
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn put_requests_kms_encryption_and_length() {
        let rule = mock!(Client::put_object)
            .match_requests(|req| {
                req.server_side_encryption() == Some(&ServerSideEncryption::AwsKms)
                    && req.content_length() == Some(5)
                    && req.content_type() == Some("text/plain")
            })
            .then_output(|| PutObjectOutput::builder().build());
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let options = PutOptions {
            content_length: Some(5),
            content_type: Some("text/plain".into()),
            ..PutOptions::encrypted()
        };
        backend
            .put("documents", "note.txt", Bytes::from("hello"), options)
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn list_page_carries_continuation_token() {
        let rule = mock!(Client::list_objects_v2)
            .match_requests(|req| {
                req.prefix() == Some("case/") && req.continuation_token() == Some("page-1")
            })
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("case/1/submission.json").build())
                    .contents(Object::builder().build())
                    .contents(Object::builder().key("case/2/submission.json").build())
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let page = backend
            .list_page("documents", "case/", Some("page-1"))
            .await
            .unwrap();
        assert_eq!(page.keys, ["case/1/submission.json", "case/2/submission.json"]);
        assert!(page.is_truncated);
        assert_eq!(page.next_token().unwrap(), Some("page-2"));
    }

    #[tokio::test]
    async fn list_page_without_truncation_flag_is_last() {
        let rule = mock!(Client::list_objects_v2).then_output(|| {
            ListObjectsV2Output::builder()
                .contents(Object::builder().key("case/1/submission.json").build())
                .build()
        });
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let page = backend.list_page("documents", "case/", None).await.unwrap();
        assert!(!page.is_truncated);
        assert_eq!(page.continuation_token, None);
        assert_eq!(page.next_token().unwrap(), None);
    }

    #[tokio::test]
    async fn copy_failure_keeps_code_and_message() {
        let rule = mock!(Client::copy_object).then_error(|| {
            CopyObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("Access Denied")
                    .build(),
            )
        });
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let source = ObjectLocation::new("source", "in/file.pdf");
        let err = backend
            .copy("documents", "out/file.pdf", &source)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend { operation: "copy", .. }));
        assert_eq!(err.to_string(), "copy failed: AccessDenied: Access Denied");
    }

    #[tokio::test]
    async fn list_failure_without_message_keeps_code() {
        let rule = mock!(Client::list_objects_v2).then_error(|| {
            ListObjectsV2Error::generic(ErrorMetadata::builder().code("NoSuchBucket").build())
        });
        let backend = S3Backend::new(mock_client!(aws_sdk_s3, [&rule]), "eu-central-1");

        let err = backend.list_page("missing", "", None).await.unwrap_err();
        assert_eq!(err.to_string(), "list failed: NoSuchBucket");
        assert!(!err.is_not_found());
    }
}
