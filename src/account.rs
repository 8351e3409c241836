//! Account-scoped operations.

use http::Method;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::auth::{authenticate, Credentials, Session};
use crate::client::Context;
use crate::config::Config;
use crate::container::Container;
use crate::errors::{Reply, ReplyPolicy, Result};
use crate::format::{ArchiveReport, Listing, ResponseFormat};
use crate::http::{ReqwestTransport, RequestOutcome, Transport, TransportInfo};
use crate::tempurl;

/// Default number of entries requested by listings.
pub const DEFAULT_LIST_LIMIT: u32 = 10_000;

/// A client bound to one authenticated storage account.
///
/// Cloning is cheap and clones share the underlying transport.
#[derive(Clone)]
pub struct StorageAccount {
    ctx: Context,
}

impl StorageAccount {
    /// Authenticate with the settings in `config` over a `reqwest` transport.
    pub async fn connect(config: &Config) -> Result<Reply<Self>> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Self::authenticate(
            transport,
            &config.auth.url,
            &Credentials::new(config.auth.user.as_str(), config.auth.key.as_str()),
            config.client.response_format(),
            config.client.reply_policy,
        )
        .await
    }

    /// Authenticate over an arbitrary transport.
    pub async fn authenticate(
        transport: Arc<dyn Transport>,
        auth_url: &str,
        credentials: &Credentials,
        format: ResponseFormat,
        policy: ReplyPolicy,
    ) -> Result<Reply<Self>> {
        let reply =
            authenticate(transport.as_ref(), auth_url, credentials, format, policy).await?;
        Ok(reply.map(|session| Self::from_session(transport, session, policy)))
    }

    /// Wrap an existing session.
    pub fn from_session(transport: Arc<dyn Transport>, session: Session, policy: ReplyPolicy) -> Self {
        Self {
            ctx: Context {
                transport,
                endpoint_url: session.endpoint_url,
                token: session.auth_token,
                format: session.format,
                policy,
            },
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.ctx.endpoint_url
    }

    pub fn format(&self) -> ResponseFormat {
        self.ctx.format
    }

    fn url(&self, name: &str) -> String {
        format!("{}{}", self.ctx.endpoint_url, name)
    }

    /// Account `x-*` headers (object counts, bytes used, metadata).
    pub async fn info(&self) -> Result<Reply<BTreeMap<String, String>>> {
        let (code, headers) = self.ctx.head_x(&self.ctx.endpoint_url).await?;
        self.ctx.policy.check(code, &[200, 204], "account_info", || headers)
    }

    /// List container names.  The status is not checked.
    pub async fn list_containers(
        &self,
        limit: u32,
        marker: &str,
        format: Option<ResponseFormat>,
    ) -> Result<Listing> {
        let format = self.ctx.format_or_default(format);
        let request = self
            .ctx
            .request(Method::GET, self.ctx.endpoint_url.as_str())
            .param("limit", Some(limit))
            .param("marker", Some(marker));
        self.ctx.list(request, format).await
    }

    /// Create a container, then fetch its canonical metadata.
    pub async fn create_container(
        &self,
        name: &str,
        headers: &[(&str, &str)],
    ) -> Result<Reply<Container>> {
        let outcome = self
            .ctx
            .execute(
                self.ctx
                    .request(Method::PUT, self.url(name))
                    .headers(headers.iter().copied()),
            )
            .await?;
        let code = outcome.code();
        if let Reply::Status(code) =
            self.ctx
                .policy
                .check(code, &[201, 202], "create_container", || ())?
        {
            return Ok(Reply::Status(code));
        }
        info!("Created container {}", name);
        self.get_container(name).await
    }

    /// Open a container, loading its `x-*` headers.
    pub async fn get_container(&self, name: &str) -> Result<Reply<Container>> {
        let url = self.url(name);
        let (code, headers) = self.ctx.head_x(&url).await?;
        let reply = self.ctx.policy.check(code, &[204], "get_container", || headers)?;
        match reply {
            Reply::Done(headers) => Container::open(self.ctx.clone(), &url, headers).await,
            Reply::Status(code) => Ok(Reply::Status(code)),
        }
    }

    /// Delete a container or a `container/object` path.
    pub async fn delete(&self, name: &str) -> Result<Reply<TransportInfo>> {
        self.ctx.delete(self.url(name)).await
    }

    /// Server-side copy of `origin` to `destination`, both relative to the
    /// account root.  The status is not checked.
    pub async fn copy(&self, origin: &str, destination: &str) -> Result<RequestOutcome> {
        self.ctx
            .copy(&self.ctx.endpoint_url, origin, destination)
            .await
    }

    /// Set `X-Container-Meta-*` headers on a container.  Other headers
    /// are dropped.
    pub async fn set_container_headers(
        &self,
        name: &str,
        headers: &[(&str, &str)],
    ) -> Result<Reply<u16>> {
        self.ctx
            .post_container_meta(self.url(name), headers, &[204], "set_container_headers")
            .await
    }

    /// Store the key used to sign temp URLs.  Run once per account.
    pub async fn set_account_meta_temp_url_key(&self, key: &str) -> Result<Reply<u16>> {
        let outcome = self
            .ctx
            .execute(
                self.ctx
                    .request(Method::POST, self.ctx.endpoint_url.as_str())
                    .header("X-Account-Meta-Temp-URL-Key", key),
            )
            .await?;
        let code = outcome.head.code;
        self.ctx
            .policy
            .check(code, &[202], "set_account_meta_temp_url_key", || code)
    }

    /// Signed download link for `path` (`/container/object`) valid until
    /// the Unix time `expires`.
    pub fn temp_url(&self, key: &str, path: &str, expires: u64, filename: Option<&str>) -> String {
        tempurl::temp_url(&self.ctx.endpoint_url, key, path, expires, filename)
    }

    /// Upload an archive and let the server unpack it under `extract_path`.
    /// The status is not checked.
    pub async fn put_archive(
        &self,
        archive: impl AsRef<Path>,
        extract_path: Option<&str>,
    ) -> Result<ArchiveReport> {
        self.ctx
            .put_archive(&self.ctx.endpoint_url, archive.as_ref(), extract_path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SwiftError;
    use crate::http::mock::MockTransport;
    use crate::http::Body;

    const ROOT: &str = "https://12345.selcdn.ru/";

    fn account(transport: &Arc<MockTransport>, policy: ReplyPolicy) -> StorageAccount {
        account_with_format(transport, policy, ResponseFormat::Plain)
    }

    fn account_with_format(
        transport: &Arc<MockTransport>,
        policy: ReplyPolicy,
        format: ResponseFormat,
    ) -> StorageAccount {
        StorageAccount::from_session(
            transport.clone(),
            Session {
                endpoint_url: ROOT.to_string(),
                auth_token: "tok".to_string(),
                format,
            },
            policy,
        )
    }

    #[tokio::test]
    async fn test_authenticate_then_create_container() {
        let transport = MockTransport::new();
        transport.respond(
            204,
            &[("X-Storage-Url", ROOT), ("X-Storage-Token", "tok")],
            "",
        );
        transport.respond(201, &[], "");
        transport.respond(204, &[("X-Container-Object-Count", "0")], "");

        let account = StorageAccount::authenticate(
            transport.clone(),
            "https://auth.selcdn.ru/",
            &Credentials::new("12345", "secret"),
            ResponseFormat::Plain,
            ReplyPolicy::Fail,
        )
        .await
        .unwrap()
        .done()
        .unwrap();
        assert_eq!(account.endpoint_url(), ROOT);

        let container = account
            .create_container("photos", &[("X-Container-Meta-Type", "public")])
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(container.info()["x-container-object-count"], "0");
        assert_eq!(container.url(), "https://12345.selcdn.ru/photos/");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, Method::PUT);
        assert_eq!(requests[1].url, "https://12345.selcdn.ru/photos");
        assert_eq!(requests[1].header("X-Auth-Token"), Some("tok"));
        assert_eq!(requests[1].header("X-Container-Meta-Type"), Some("public"));
        assert_eq!(requests[2].method, Method::HEAD);
        assert_eq!(requests[2].url, "https://12345.selcdn.ru/photos");
    }

    #[tokio::test]
    async fn test_create_container_accepts_202() {
        let transport = MockTransport::new();
        transport.respond(202, &[], "");
        transport.respond(204, &[("X-Container-Bytes-Used", "0")], "");

        let reply = account(&transport, ReplyPolicy::Fail)
            .create_container("existing", &[])
            .await
            .unwrap();
        assert!(reply.is_done());
    }

    #[tokio::test]
    async fn test_create_container_failure_skips_head() {
        let transport = MockTransport::new();
        transport.respond(507, &[], "");

        let reply = account(&transport, ReplyPolicy::ReturnCode)
            .create_container("full", &[])
            .await
            .unwrap();
        assert_eq!(reply.status(), Some(507));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_get_container_missing_fails() {
        let transport = MockTransport::new();
        transport.respond(404, &[], "");

        let err = account(&transport, ReplyPolicy::Fail)
            .get_container("missing")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SwiftError::UnexpectedStatus {
                code: 404,
                operation: "get_container"
            }
        ));
    }

    #[tokio::test]
    async fn test_get_container_missing_returns_code() {
        let transport = MockTransport::new();
        transport.respond(404, &[], "");

        let reply = account(&transport, ReplyPolicy::ReturnCode)
            .get_container("missing")
            .await
            .unwrap();
        assert_eq!(reply.status(), Some(404));
    }

    #[tokio::test]
    async fn test_list_containers_plain() {
        let transport = MockTransport::new();
        transport.respond(200, &[], "a\nb\nc\n");

        let listing = account(&transport, ReplyPolicy::Fail)
            .list_containers(DEFAULT_LIST_LIMIT, "", None)
            .await
            .unwrap();
        assert_eq!(listing.names().unwrap(), ["a", "b", "c"]);
        assert_eq!(
            transport.last_request().url,
            "https://12345.selcdn.ru/?limit=10000&marker=&format="
        );
    }

    #[tokio::test]
    async fn test_list_containers_json_override() {
        let transport = MockTransport::new();
        transport.respond(200, &[], "[{\"name\":\"a\"}]\n");

        let listing = account(&transport, ReplyPolicy::Fail)
            .list_containers(10, "m", Some(ResponseFormat::Json))
            .await
            .unwrap();
        assert_eq!(listing, Listing::Raw("[{\"name\":\"a\"}]".to_string()));
        assert!(transport.last_request().url.ends_with("?limit=10&marker=m&format=json"));
    }

    #[tokio::test]
    async fn test_list_containers_does_not_check_status() {
        let transport = MockTransport::new();
        transport.respond(401, &[], "Unauthorized");

        let listing = account(&transport, ReplyPolicy::Fail)
            .list_containers(DEFAULT_LIST_LIMIT, "", None)
            .await
            .unwrap();
        assert_eq!(listing, Listing::Names(vec!["Unauthorized".to_string()]));
    }

    #[tokio::test]
    async fn test_info_is_idempotent() {
        let transport = MockTransport::new();
        let headers = [
            ("X-Account-Container-Count", "2"),
            ("X-Account-Bytes-Used", "1024"),
            ("Content-Type", "text/plain"),
        ];
        transport.respond(204, &headers, "");
        transport.respond(204, &headers, "");

        let account = account(&transport, ReplyPolicy::Fail);
        let first = account.info().await.unwrap().done().unwrap();
        let second = account.info().await.unwrap().done().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first["x-account-bytes-used"], "1024");
    }

    #[tokio::test]
    async fn test_delete_requires_204() {
        let transport = MockTransport::new();
        transport.respond(204, &[], "");
        transport.respond(409, &[], "");

        let account = account(&transport, ReplyPolicy::Fail);
        let info = account.delete("photos/cat.jpg").await.unwrap().done().unwrap();
        assert_eq!(info.http_code, 204);
        assert_eq!(transport.last_request().method, Method::DELETE);
        assert_eq!(
            transport.last_request().url,
            "https://12345.selcdn.ru/photos/cat.jpg"
        );

        let err = account.delete("photos").await.unwrap_err();
        assert_eq!(err.status_code(), Some(409));
    }

    #[tokio::test]
    async fn test_copy_sets_destination_and_skips_status_check() {
        let transport = MockTransport::new();
        transport.respond(404, &[], "");

        let outcome = account(&transport, ReplyPolicy::Fail)
            .copy("photos/cat.jpg", "backup/cat.jpg")
            .await
            .unwrap();
        assert_eq!(outcome.code(), 404);

        let request = transport.last_request();
        assert_eq!(request.method.as_str(), "COPY");
        assert_eq!(request.url, "https://12345.selcdn.ru/photos/cat.jpg");
        assert_eq!(request.header("Destination"), Some("/backup/cat.jpg"));
    }

    #[tokio::test]
    async fn test_set_container_headers_filters_meta() {
        let transport = MockTransport::new();
        transport.respond(204, &[], "");

        let code = account(&transport, ReplyPolicy::Fail)
            .set_container_headers(
                "photos",
                &[
                    ("X-Container-Meta-Type", "public"),
                    ("X-Object-Meta-Ignored", "x"),
                    ("Content-Type", "text/plain"),
                ],
            )
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(code, 204);

        let request = transport.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("X-Container-Meta-Type"), Some("public"));
        assert!(request.header("X-Object-Meta-Ignored").is_none());
        assert!(request.header("Content-Type").is_none());
    }

    #[tokio::test]
    async fn test_set_temp_url_key() {
        let transport = MockTransport::new();
        transport.respond(202, &[], "");
        transport.respond(204, &[], "");

        let account = account(&transport, ReplyPolicy::ReturnCode);
        assert_eq!(
            account.set_account_meta_temp_url_key("k").await.unwrap(),
            Reply::Done(202)
        );
        assert_eq!(
            transport.last_request().header("X-Account-Meta-Temp-URL-Key"),
            Some("k")
        );
        assert_eq!(
            account.set_account_meta_temp_url_key("k").await.unwrap(),
            Reply::Status(204)
        );
    }

    #[test]
    fn test_temp_url_uses_endpoint() {
        let transport = MockTransport::new();
        let url = account(&transport, ReplyPolicy::Fail).temp_url(
            "secretkey",
            "/photos/cat.jpg",
            1_600_000_000,
            Some("cat.jpg"),
        );
        let sig = tempurl::sign("secretkey", "GET", "/photos/cat.jpg", 1_600_000_000);
        assert_eq!(
            url,
            format!(
                "https://12345.selcdn.ru/photos/cat.jpg?temp_url_sig={sig}&temp_url_expires=1600000000&filename=cat.jpg"
            )
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_put_archive_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("site.tar.gz");
        std::fs::write(&archive, b"archive-bytes").unwrap();

        let transport = MockTransport::new();
        transport.respond(201, &[], "{\"Number Files Created\": 3, \"Errors\": []}");

        let report = account_with_format(&transport, ReplyPolicy::Fail, ResponseFormat::Json)
            .put_archive(&archive, Some("site"))
            .await
            .unwrap();
        assert_eq!(
            report,
            ArchiveReport::Json(serde_json::json!({"Number Files Created": 3, "Errors": []}))
        );

        let request = transport.last_request();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.url, "https://12345.selcdn.ru/site?extract-archive=gz");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(
            request.body,
            Body::File {
                path: archive.clone(),
                len: 13
            }
        );
    }

    #[tokio::test]
    async fn test_put_archive_missing_file() {
        let transport = MockTransport::new();
        let err = account(&transport, ReplyPolicy::Fail)
            .put_archive("/definitely/not/here.tar", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwiftError::NotFound { .. }));
        assert!(transport.requests().is_empty());
    }
}
