use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const SEPARATOR: &str = "-----------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Play(PlayRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub sfx: String,
    pub name: String,
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct PlayPayload<'a> {
    name: &'a str,
    id: i64,
    message: &'a str,
    timestamp: String,
}

pub struct SfxClient {
    http: reqwest::blocking::Client,
    base: Url,
    verbose: bool,
}

impl SfxClient {
    pub fn new(address: &str, verbose: bool) -> Result<Self> {
        let base = base_url(address)?;
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("cybersonic/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base, verbose })
    }

    pub fn run(&self, command: &Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::List => self.list_all(out),
            Command::Play(request) => self.play(request, out),
        }
    }

    pub fn list_all(&self, out: &mut impl Write) -> Result<()> {
        let url = self.base.join("all")?;
        if self.verbose {
            writeln!(out, "Sending GET request:")?;
            writeln!(out, "URL: {}", url)?;
            writeln!(out, "{}", SEPARATOR)?;
        }
        let response = self
            .http
            .get(url)
            .send()
            .context("Error sending request")?;
        self.write_response(response, out)
    }

    pub fn play(&self, request: &PlayRequest, out: &mut impl Write) -> Result<()> {
        let payload = PlayPayload {
            name: &request.name,
            id: request.id,
            message: &request.message,
            timestamp: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        };
        let json = serde_json::to_string(&payload).context("Error encoding JSON")?;

        let mut url = self.base.join("sfx")?;
        url.query_pairs_mut().append_pair("name", &request.sfx);

        if self.verbose {
            writeln!(out, "Sending POST request:")?;
            writeln!(out, "URL: {}", url)?;
            writeln!(out, "Headers:")?;
            writeln!(out, "  Content-Type: application/json")?;
            writeln!(out, "Body:")?;
            writeln!(out, "  SFX Name: {}", request.sfx)?;
            writeln!(out, "  Name: {}", payload.name)?;
            writeln!(out, "  ID: {}", payload.id)?;
            writeln!(out, "  Message: {}", payload.message)?;
            writeln!(out, "  Timestamp: {}", payload.timestamp)?;
            writeln!(out, "JSON Payload:")?;
            writeln!(out, "{}", json)?;
            writeln!(out, "{}", SEPARATOR)?;
        }

        tracing::debug!(url = %url, "Posting sound request");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .context("Error sending request")?;
        self.write_response(response, out)
    }

    fn write_response(
        &self,
        response: reqwest::blocking::Response,
        out: &mut impl Write,
    ) -> Result<()> {
        if self.verbose {
            writeln!(out, "Response:")?;
            writeln!(out, "Status: {}", response.status())?;
            writeln!(out, "Headers:")?;
            for (name, value) in response.headers() {
                writeln!(out, "  {}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out, "Body:")?;
            writeln!(out, "{}", SEPARATOR)?;
        }
        let body = response.bytes().context("Error reading response")?;
        out.write_all(&body)?;
        out.flush()?;
        Ok(())
    }
}

/// Accepts `host:port` or a full `http://host:port` URL.
fn base_url(address: &str) -> Result<Url> {
    let address = address.trim().trim_end_matches('/');
    if address.is_empty() {
        return Err(anyhow!("Server address is empty"));
    }
    let raw = if address.contains("://") {
        format!("{}/", address)
    } else {
        format!("http://{}/", address)
    };
    let url = Url::parse(&raw).with_context(|| format!("Invalid server address: {}", address))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("Unsupported scheme: {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(anyhow!("Server address has no host"));
    }
    Ok(url)
}
