use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{emit_all, ProgramCap, ProgramOutcome, ScanSummary};
use crate::config::{Credentials, HackerOneConfig, IncludeCap};
use crate::errors::{ScanError, ScanResult};
use crate::http_client::FetchClient;
use crate::output::TargetSink;
use crate::scope;

pub const HACKERONE_API_URL: &str = "https://api.hackerone.com/v1/hackers/programs";

static HANDLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https://hackerone\.com/([^?#/]+)").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProgramPage {
    data: Vec<ProgramData>,
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProgramData {
    attributes: ProgramAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProgramAttributes {
    handle: String,
    offers_bounties: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Links {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopePage {
    data: Vec<ScopeData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopeData {
    attributes: ScopeAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopeAttributes {
    asset_type: String,
    asset_identifier: String,
}

/// Program handle from a `https://hackerone.com/<handle>` URL.
///
/// The handle ends at the first `?`, `#` or `/`, so query strings, fragments
/// and sub-pages such as `/policy_scopes` all resolve to the same program.
pub fn extract_handle(program_url: &str) -> Option<&str> {
    HANDLE_RE
        .captures(program_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `bounty` keeps paying programs, `points`/`vdp` keeps the rest; unknown offers pass.
fn reward_accepts(reward: &str, offers_bounties: Option<bool>) -> bool {
    match reward.to_ascii_lowercase().as_str() {
        "bounty" => offers_bounties != Some(false),
        "points" | "vdp" => offers_bounties != Some(true),
        _ => true,
    }
}

/// Walks the HackerOne hacker API and prints the structured scopes of each program.
pub struct HackerOneScanner<'a> {
    client: &'a FetchClient,
    config: &'a HackerOneConfig,
    creds: &'a Credentials,
    base_url: String,
}

impl<'a> HackerOneScanner<'a> {
    pub fn new(client: &'a FetchClient, config: &'a HackerOneConfig, creds: &'a Credentials) -> Self {
        Self { client, config, creds, base_url: HACKERONE_API_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn run(&self, sink: &mut dyn TargetSink) -> ScanResult<ScanSummary> {
        if self.config.platform.include.is_empty() {
            self.run_paginated(sink).await
        } else {
            self.run_include(sink).await
        }
    }

    async fn run_include(&self, sink: &mut dyn TargetSink) -> ScanResult<ScanSummary> {
        let policy = self.config.platform.include_cap_or(IncludeCap::First);
        let mut cap = ProgramCap::new(self.config.platform.max_programs);
        let mut summary = ScanSummary::default();

        for program_url in &self.config.platform.include {
            let Some(handle) = extract_handle(program_url) else {
                summary.skipped += 1;
                sink.skipped(program_url, &ScanError::UnmatchedInclude(program_url.clone()));
                continue;
            };
            tracing::info!(%handle, "hackerone include");

            let outcome = self.scan_program(handle, sink).await?;
            let yielded = summary.record(handle, outcome, sink);
            if cap.record_included(policy, yielded) {
                summary.capped = true;
                break;
            }
        }
        Ok(summary)
    }

    async fn run_paginated(&self, sink: &mut dyn TargetSink) -> ScanResult<ScanSummary> {
        let mut cap = ProgramCap::new(self.config.platform.max_programs);
        let mut summary = ScanSummary::default();
        let mut next = Some(self.base_url.clone());

        while let Some(url) = next.take() {
            let resp = self.client.get_api(&url, self.creds).await?;
            let page: ProgramPage = serde_json::from_str(&resp.body).map_err(|e| ScanError::decode(&url, e))?;

            for program in &page.data {
                let attrs = &program.attributes;
                if !reward_accepts(&self.config.platform.reward, attrs.offers_bounties) {
                    tracing::debug!(handle = %attrs.handle, "reward filter excludes program");
                    continue;
                }

                let outcome = self.scan_program(&attrs.handle, sink).await?;
                let yielded = summary.record(&attrs.handle, outcome, sink);
                if cap.record(yielded) {
                    tracing::info!(max = self.config.platform.max_programs, "hackerone program limit reached");
                    summary.capped = true;
                    return Ok(summary);
                }
            }

            next = page.links.next.filter(|n| !n.is_empty() && *n != url);
        }

        Ok(summary)
    }

    pub fn scopes_url(&self, handle: &str) -> String {
        format!("{}/{}/structured_scopes?page[size]=100", self.base_url, handle)
    }

    async fn scan_program(&self, handle: &str, sink: &mut dyn TargetSink) -> ScanResult<ProgramOutcome> {
        let scopes = match self.structured_scopes(handle).await {
            Ok(scopes) => scopes,
            Err(e) => return Ok(ProgramOutcome::Skipped(e)),
        };

        let cfg = &self.config.platform;
        let mut emitted = 0;
        for attrs in scopes.iter().map(|s| &s.attributes) {
            let found = scope::hackerone_targets(cfg.scope, self.config.all_mode, &attrs.asset_type, &attrs.asset_identifier);
            emitted += emit_all(sink, found)?;
        }
        tracing::debug!(%handle, emitted, "hackerone program scanned");
        Ok(ProgramOutcome::from_count(emitted))
    }

    async fn structured_scopes(&self, handle: &str) -> ScanResult<Vec<ScopeData>> {
        let url = self.scopes_url(handle);
        let resp = self.client.get_api(&url, self.creds).await?;

        // Nothing classifiable in the document; skip the JSON decode.
        if !resp.body.contains("URL") && !resp.body.contains("WILDCARD") {
            return Ok(Vec::new());
        }

        let page: ScopePage = serde_json::from_str(&resp.body).map_err(|e| ScanError::decode(&url, e))?;
        Ok(page.data)
    }
}
