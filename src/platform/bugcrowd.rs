use serde::Deserialize;
use url::Url;

use super::{emit_all, ProgramCap, ProgramOutcome, ScanSummary};
use crate::config::{BugcrowdConfig, IncludeCap};
use crate::errors::{ScanError, ScanResult};
use crate::html;
use crate::http_client::FetchClient;
use crate::output::TargetSink;
use crate::scope;

pub const BUGCROWD_BASE_URL: &str = "https://bugcrowd.com";

const ENDPOINTS_ATTRIBUTE: &str = "data-api-endpoints";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PaginationMeta {
    total_count: u64,
    limit: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EngagementPage {
    pagination_meta: PaginationMeta,
    engagements: Vec<Engagement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Engagement {
    pub name: String,
    pub brief_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BriefDocument {
    data: BriefData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BriefData {
    scope: Vec<ScopeItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeItem {
    pub name: Option<String>,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Target {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub category: Option<String>,
}

/// Walks Bugcrowd engagements and prints the in-scope targets of each brief.
pub struct BugcrowdScanner<'a> {
    client: &'a FetchClient,
    config: &'a BugcrowdConfig,
    base_url: String,
}

impl<'a> BugcrowdScanner<'a> {
    pub fn new(client: &'a FetchClient, config: &'a BugcrowdConfig) -> Self {
        Self { client, config, base_url: BUGCROWD_BASE_URL.to_string() }
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

    /// Scan only the literal program URLs from the template.
    async fn run_include(&self, sink: &mut dyn TargetSink) -> ScanResult<ScanSummary> {
        let policy = self.config.platform.include_cap_or(IncludeCap::Ignore);
        let mut cap = ProgramCap::new(self.config.platform.max_programs);
        let mut summary = ScanSummary::default();

        for program_url in &self.config.platform.include {
            let outcome = self.scan_program(program_url, sink).await?;
            let yielded = summary.record(program_url, outcome, sink);
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
        let mut page = 1u64;
        let mut total_pages = 1u64;

        while page <= total_pages {
            let url = self.listing_url(page);
            let resp = self.client.get(&url).await?;
            let listing: EngagementPage =
                serde_json::from_str(&resp.body).map_err(|e| ScanError::decode(&url, e))?;

            if page == 1 && listing.pagination_meta.limit > 0 {
                total_pages = listing.pagination_meta.total_count.div_ceil(listing.pagination_meta.limit);
                tracing::info!(total = listing.pagination_meta.total_count, pages = total_pages, "bugcrowd engagements");
            }

            for engagement in &listing.engagements {
                let program_url = format!("{}{}", self.base_url, engagement.brief_url);
                let outcome = self.scan_program(&program_url, sink).await?;
                let yielded = summary.record(&program_url, outcome, sink);
                if cap.record(yielded) {
                    tracing::info!(max = self.config.platform.max_programs, "bugcrowd program limit reached");
                    summary.capped = true;
                    return Ok(summary);
                }
            }

            page += 1;
        }

        Ok(summary)
    }

    /// Engagement listing URL for `page`, carrying the category and reward filters.
    pub fn listing_url(&self, page: u64) -> String {
        let cfg = &self.config.platform;
        let mut url = match Url::parse(&format!("{}/engagements.json", self.base_url)) {
            Ok(u) => u,
            Err(_) => return format!("{}/engagements.json?page={}", self.base_url, page),
        };
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("page", &page.to_string());
            if !cfg.category.is_empty() {
                q.append_pair("target_categories", &cfg.category);
            }
            match cfg.reward.as_str() {
                "" => {}
                "points" => {
                    q.append_pair("category", "vdp");
                }
                amount => {
                    q.append_pair("category", "bug_bounty");
                    q.append_pair("rewards_operator", "gte");
                    q.append_pair("rewards_amount", amount);
                }
            }
        }
        url.into()
    }

    /// Fetch failures become a skip; only a failed write comes back as `Err`.
    async fn scan_program(&self, program_url: &str, sink: &mut dyn TargetSink) -> ScanResult<ProgramOutcome> {
        let items = match self.program_scope(program_url).await {
            Ok(items) => items,
            Err(e) => return Ok(ProgramOutcome::Skipped(e)),
        };

        let mut emitted = 0;
        for target in items.iter().flat_map(|item| &item.targets) {
            let category = target.category.as_deref().unwrap_or_default();
            if !self.config.platform.accepts_category(category) {
                continue;
            }
            let found = scope::bugcrowd_targets(
                self.config.platform.scope,
                target.name.as_deref().unwrap_or_default(),
                target.uri.as_deref().unwrap_or_default(),
            );
            emitted += emit_all(sink, found)?;
        }
        tracing::debug!(program = %program_url, emitted, "bugcrowd program scanned");
        Ok(ProgramOutcome::from_count(emitted))
    }

    async fn program_scope(&self, program_url: &str) -> ScanResult<Vec<ScopeItem>> {
        let brief = self.brief_document_url(program_url).await?;
        self.scope_items(&format!("{}.json", brief)).await
    }

    /// Resolve the brief document URL advertised in the program page's
    /// `data-api-endpoints` JSON.
    pub async fn brief_document_url(&self, program_url: &str) -> ScanResult<String> {
        let page = self.client.get(program_url).await?;
        let container = self.config.require_container.then_some(self.config.container_class.as_str());
        let raw = html::first_attribute(&page.body, "div", ENDPOINTS_ATTRIBUTE, container)
            .ok_or(ScanError::BriefEndpointMissing)?;

        let endpoints: serde_json::Value = serde_json::from_str(&raw).map_err(ScanError::BriefEndpointMalformed)?;
        let path = endpoints
            .get("engagementBriefApi")
            .and_then(|api| api.get("getBriefVersionDocument"))
            .and_then(serde_json::Value::as_str)
            .ok_or(ScanError::BriefDocumentMissing)?;
        Ok(format!("{}{}", self.base_url, path))
    }

    async fn scope_items(&self, brief_url: &str) -> ScanResult<Vec<ScopeItem>> {
        let resp = self.client.get(brief_url).await?;
        let doc: BriefDocument = serde_json::from_str(&resp.body).map_err(|e| ScanError::decode(brief_url, e))?;
        Ok(doc.data.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn listing_for(cfg: &BugcrowdConfig, client: &FetchClient) -> String {
        BugcrowdScanner::new(client, cfg).listing_url(2)
    }

    #[test]
    fn listing_url_filters() {
        let client = FetchClient::new(None, Duration::from_secs(5)).unwrap();
        let mut cfg = BugcrowdConfig::default();
        assert_eq!(listing_for(&cfg, &client), "https://bugcrowd.com/engagements.json?page=2");

        cfg.platform.category = "website".into();
        cfg.platform.reward = "points".into();
        assert_eq!(
            listing_for(&cfg, &client),
            "https://bugcrowd.com/engagements.json?page=2&target_categories=website&category=vdp"
        );

        cfg.platform.category.clear();
        cfg.platform.reward = "500".into();
        assert_eq!(
            listing_for(&cfg, &client),
            "https://bugcrowd.com/engagements.json?page=2&category=bug_bounty&rewards_operator=gte&rewards_amount=500"
        );
    }

    #[test]
    fn brief_document_tolerates_nulls() {
        let doc: BriefDocument = serde_json::from_str(
            r#"{"data":{"scope":[{"name":"In scope","targets":[{"name":"*.foo.com","uri":null,"category":"website","extra":1}]}]}}"#,
        )
        .unwrap();
        let t = &doc.data.scope[0].targets[0];
        assert_eq!(t.name.as_deref(), Some("*.foo.com"));
        assert!(t.uri.is_none());
    }

    #[test]
    fn listing_page_parses() {
        let page: EngagementPage = serde_json::from_str(
            r#"{"paginationMeta":{"totalCount":49,"limit":24},"engagements":[{"name":"Acme","briefUrl":"/engagements/acme"}]}"#,
        )
        .unwrap();
        assert_eq!(page.pagination_meta.total_count.div_ceil(page.pagination_meta.limit), 3);
        assert_eq!(page.engagements[0].brief_url, "/engagements/acme");
    }
}
