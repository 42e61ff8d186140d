//! Transport backed by the external `curl` binary, plus a renderer for
//! copy-pasteable cURL command lines.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::TransportConfig;
use crate::encoding::EncodedBody;
use crate::error::TransportError;

use super::TransportGateway;
use super::method::HttpMethod;
use super::request::PreparedRequest;
use super::response::RawResponse;

/// Marker separating the response body from the status code on stdout.
const STATUS_MARKER: &str = "\n__JETRAAY_STATUS__:";

/// curl's exit code for "operation timed out".
const CURL_TIMEOUT_EXIT: i32 = 28;

#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: String,
    timeout: Option<Duration>,
    proxy_url: Option<String>,
    verify_ssl: bool,
    max_redirects: usize,
}

impl CurlTransport {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            program: config.curl_path.clone(),
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
            proxy_url: config.proxy_url.clone().filter(|url| !url.is_empty()),
            verify_ssl: config.verify_ssl,
            max_redirects: config.max_redirects,
        }
    }

    fn args(&self, request: &PreparedRequest) -> Vec<String> {
        let mut args = vec!["--silent".to_string(), "--show-error".to_string()];
        args.extend(method_flags(request.method));
        args.push(request.url.clone());

        for header in &request.headers {
            args.push("-H".to_string());
            args.push(header.clone());
        }

        if sends_body(request) {
            args.push("--data-binary".to_string());
            args.push("@-".to_string());
        }

        if let Some(limit) = self.timeout {
            args.push("--max-time".to_string());
            args.push(format!("{:.3}", limit.as_secs_f64()));
        }

        if self.max_redirects > 0 {
            args.push("--location".to_string());
            args.push("--max-redirs".to_string());
            args.push(self.max_redirects.to_string());
        }
        if let Some(proxy) = &self.proxy_url {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        if !self.verify_ssl {
            args.push("--insecure".to_string());
        }

        args.push("--write-out".to_string());
        args.push(format!("{STATUS_MARKER}%{{http_code}}"));
        args
    }

    async fn run(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(request))
            .stdin(if sends_body(request) {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, method = %request.method, url = %request.url, "executing curl");

        let mut child = command.spawn().map_err(|err| {
            TransportError::Process(format!("Failed to execute `{}`: {err}", self.program))
        })?;

        let body = request.body.as_ref().filter(|_| sends_body(request));
        if let (Some(mut stdin), Some(body)) = (child.stdin.take(), body) {
            stdin
                .write_all(body.as_bytes())
                .await
                .map_err(|err| TransportError::Process(format!("Failed to write request body: {err}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| TransportError::Process(format!("Failed to wait for curl: {err}")))?;

        if output.status.code() == Some(CURL_TIMEOUT_EXIT) {
            return Err(TransportError::Timeout);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = ?output.status.code(), %stderr, "curl failed");
            return Err(TransportError::Network(stderr));
        }

        let mut response = parse_output(&String::from_utf8_lossy(&output.stdout))?;
        if request.method == HttpMethod::Head {
            // `--head` prints the response headers where the body would go.
            response.body.clear();
        }
        Ok(response)
    }
}

/// `-X HEAD` leaves curl waiting for a body that never comes, so HEAD uses
/// `--head`.
fn method_flags(method: HttpMethod) -> Vec<String> {
    match method {
        HttpMethod::Head => vec!["--head".to_string()],
        other => vec!["-X".to_string(), other.to_string()],
    }
}

/// curl refuses `--head` together with request data.
fn sends_body(request: &PreparedRequest) -> bool {
    request.body.is_some() && request.method != HttpMethod::Head
}

impl TransportGateway for CurlTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        match self.timeout {
            // Dropping the timed-out future kills the child.
            Some(limit) => tokio::time::timeout(limit, self.run(request))
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => self.run(request).await,
        }
    }
}

fn parse_output(stdout: &str) -> Result<RawResponse, TransportError> {
    let (body, status) = stdout
        .rsplit_once(STATUS_MARKER)
        .ok_or_else(|| TransportError::Process("curl output has no status trailer".to_string()))?;
    let status = status
        .trim()
        .parse()
        .map_err(|_| TransportError::Process(format!("Unexpected curl status `{status}`")))?;

    Ok(RawResponse {
        status,
        body: body.to_string(),
    })
}

/// Render `request` as a shell command line.
///
/// Binary bodies cannot be inlined; they are read from stdin (`@-`).
pub fn curl_command(request: &PreparedRequest) -> String {
    let mut parts = vec!["curl".to_string()];
    parts.extend(method_flags(request.method));
    parts.push(shell_quote(&request.url));

    for header in &request.headers {
        parts.push("-H".to_string());
        parts.push(shell_quote(header));
    }

    match request.body.as_ref().filter(|_| sends_body(request)) {
        Some(EncodedBody::Text(text)) => {
            parts.push("--data-raw".to_string());
            parts.push(shell_quote(text));
        }
        Some(EncodedBody::Binary(_)) => {
            parts.push("--data-binary".to_string());
            parts.push("@-".to_string());
        }
        None => {}
    }

    parts.join(" ")
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
