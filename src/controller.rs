use crate::config::{Credentials, RunConfig};
use crate::errors::{ScanError, ScanResult};
use crate::http_client::FetchClient;
use crate::output::TargetSink;
use crate::platform::{BugcrowdScanner, HackerOneScanner, ScanSummary};

#[derive(Debug)]
pub struct PlatformReport {
    pub platform: &'static str,
    pub result: ScanResult<ScanSummary>,
}

/// Runs every configured platform in turn. A failing platform is reported
/// and does not stop the next one, unless the output itself was closed.
pub struct Controller<'a> {
    config: &'a RunConfig,
    client: &'a FetchClient,
    creds: Option<Credentials>,
    bugcrowd_base: Option<String>,
    hackerone_base: Option<String>,
}

impl<'a> Controller<'a> {
    pub fn new(config: &'a RunConfig, client: &'a FetchClient, creds: Option<Credentials>) -> Self {
        Self { config, client, creds, bugcrowd_base: None, hackerone_base: None }
    }

    pub fn with_bugcrowd_base(mut self, url: impl Into<String>) -> Self {
        self.bugcrowd_base = Some(url.into());
        self
    }

    pub fn with_hackerone_base(mut self, url: impl Into<String>) -> Self {
        self.hackerone_base = Some(url.into());
        self
    }

    pub async fn run(&self, sink: &mut dyn TargetSink) -> Vec<PlatformReport> {
        let mut reports = Vec::new();

        if let Some(cfg) = &self.config.findtarget.bugcrowd {
            tracing::info!(scope = %cfg.platform.scope, include = cfg.platform.include.len(), "scanning bugcrowd");
            let mut scanner = BugcrowdScanner::new(self.client, cfg);
            if let Some(base) = &self.bugcrowd_base {
                scanner = scanner.with_base_url(base.clone());
            }
            let result = scanner.run(sink).await;
            reports.push(PlatformReport { platform: "bugcrowd", result });
        }

        let output_closed = reports.iter().any(|r| r.result.as_ref().is_err_and(ScanError::is_closed_output));
        if output_closed {
            tracing::debug!("output closed, skipping remaining platforms");
        } else if let Some(cfg) = &self.config.findtarget.hackerone {
            tracing::info!(scope = %cfg.platform.scope, include = cfg.platform.include.len(), "scanning hackerone");
            let result = match &self.creds {
                Some(creds) => {
                    let mut scanner = HackerOneScanner::new(self.client, cfg, creds);
                    if let Some(base) = &self.hackerone_base {
                        scanner = scanner.with_base_url(base.clone());
                    }
                    scanner.run(sink).await
                }
                None => Err(ScanError::MissingCredential("H1_API_KEY")),
            };
            reports.push(PlatformReport { platform: "hackerone", result });
        }

        for report in &reports {
            match &report.result {
                Ok(s) => tracing::info!(
                    platform = report.platform,
                    programs = s.programs,
                    yielded = s.programs_yielded,
                    targets = s.targets,
                    skipped = s.skipped,
                    capped = s.capped,
                    "scan finished"
                ),
                Err(e) => tracing::error!(platform = report.platform, error = %e, "scan aborted"),
            }
        }
        reports
    }
}
