//! MCP tool definitions and handlers

use super::types::{ToolDefinition, ToolResult};
use crate::audit::{AuditOptions, AuditService};
use crate::models::Strategy;
use crate::store::DEFAULT_HISTORY_LIMIT;
use serde_json::{json, Map, Value};
use std::fmt::Write;
use std::str::FromStr;

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "seo_audit".to_string(),
            description: "Audit a single URL: on-page checks plus PageSpeed and crawl data when configured. Nothing is stored.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Absolute http(s) URL of the page to audit"
                    },
                    "include_lighthouse": {
                        "type": "boolean",
                        "description": "Run PageSpeed Insights (default: true)",
                        "default": true
                    },
                    "include_crawl": {
                        "type": "boolean",
                        "description": "Run the external crawler (default: true)",
                        "default": true
                    },
                    "strategy": {
                        "type": "string",
                        "enum": ["mobile", "desktop"],
                        "description": "PageSpeed device profile (default: mobile)"
                    }
                },
                "required": ["url"]
            }),
        },
        ToolDefinition {
            name: "seo_comprehensive_audit".to_string(),
            description: "Run the full audit for a registered company's website (Lighthouse, on-page, backlinks, keywords, SERP competitors) and store the result.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "company_id": {
                        "type": "string",
                        "description": "ID of a registered company"
                    }
                },
                "required": ["company_id"]
            }),
        },
        ToolDefinition {
            name: "seo_audit_history".to_string(),
            description: "List stored audits for a company, newest first.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "company_id": {
                        "type": "string",
                        "description": "ID of a registered company"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of audits to return (default: 20, max: 100)",
                        "default": 20,
                        "minimum": 1,
                        "maximum": 100
                    }
                },
                "required": ["company_id"]
            }),
        },
        ToolDefinition {
            name: "seo_companies".to_string(),
            description: "List registered companies and their websites.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// Handle a tool call
pub async fn handle_tool_call(
    name: &str,
    arguments: &Map<String, Value>,
    service: &AuditService,
) -> ToolResult {
    match name {
        "seo_audit" => handle_audit(arguments, service).await,
        "seo_comprehensive_audit" => handle_comprehensive(arguments, service).await,
        "seo_audit_history" => handle_history(arguments, service).await,
        "seo_companies" => handle_companies(service).await,
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

fn required_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<&'a str, ToolResult> {
    match arguments.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        _ => Err(ToolResult::error(format!("Missing required parameter: {}", key))),
    }
}

async fn handle_audit(arguments: &Map<String, Value>, service: &AuditService) -> ToolResult {
    let url = match required_str(arguments, "url") {
        Ok(u) => u,
        Err(e) => return e,
    };
    if url::Url::parse(url).is_err() {
        return ToolResult::error(format!("Invalid URL: {}", url));
    }

    let strategy = match arguments.get("strategy").and_then(|v| v.as_str()) {
        Some(s) => match Strategy::from_str(s) {
            Ok(strategy) => strategy,
            Err(e) => return ToolResult::error(e.to_string()),
        },
        None => service.default_strategy(),
    };
    let options = AuditOptions {
        include_lighthouse: arguments
            .get("include_lighthouse")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
        include_crawl: arguments
            .get("include_crawl")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
        strategy,
    };

    let report = service.audit_url(url, &options).await;

    let mut output = String::new();
    let _ = writeln!(output, "# SEO audit: {}\n", report.url);
    let _ = writeln!(output, "**Overall score:** {}/100", report.overall_score);
    let _ = writeln!(output, "**On-page score:** {}/100", report.basic.seo_score);
    let _ = writeln!(output, "**Performance:** {}/100", report.performance_score());
    let _ = writeln!(output, "**Accessibility:** {}/100", report.accessibility_score());
    let _ = writeln!(
        output,
        "**E-E-A-T:** experience {}, expertise {}, authoritativeness {}, trustworthiness {}\n",
        report.eeat.experience,
        report.eeat.expertise,
        report.eeat.authoritativeness,
        report.eeat.trustworthiness
    );

    if report.issues.is_empty() {
        output.push_str("No issues found.\n");
    } else {
        let _ = writeln!(output, "## Issues ({})\n", report.issues.len());
        for issue in &report.issues {
            let _ = writeln!(output, "- [{}] {}: {}", issue.impact, issue.category, issue.message);
        }
    }

    if !report.basic.recommendations.is_empty() {
        output.push_str("\n## Next steps\n\n");
        for hint in &report.basic.recommendations {
            let _ = writeln!(output, "- {}", hint);
        }
    }

    if !report.recommendations.is_empty() {
        output.push_str("\n## Recommendations\n\n");
        for rec in &report.recommendations {
            let _ = writeln!(output, "- **{}** ({}): {}", rec.title, rec.priority, rec.description);
        }
    }

    ToolResult::text(output)
}

async fn handle_comprehensive(arguments: &Map<String, Value>, service: &AuditService) -> ToolResult {
    let company_id = match required_str(arguments, "company_id") {
        Ok(id) => id,
        Err(e) => return e,
    };

    match service.comprehensive(company_id).await {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(body) => ToolResult::text(body),
            Err(e) => ToolResult::error(format!("Failed to encode result: {}", e)),
        },
        Err(e) => ToolResult::error(format!("Comprehensive audit failed: {}", e)),
    }
}

async fn handle_history(arguments: &Map<String, Value>, service: &AuditService) -> ToolResult {
    let company_id = match required_str(arguments, "company_id") {
        Ok(id) => id,
        Err(e) => return e,
    };
    let limit = arguments
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v.clamp(1, 100) as u32)
        .unwrap_or(DEFAULT_HISTORY_LIMIT);

    let store = service.store();
    let company = match store.require_company(company_id).await {
        Ok(c) => c,
        Err(e) => return ToolResult::error(e.to_string()),
    };

    match store.list_audits(company_id, limit).await {
        Ok(audits) if audits.is_empty() => {
            ToolResult::text(format!("No audits stored for {}.", company.name))
        }
        Ok(audits) => {
            let mut output = format!("Audits for {} ({}):\n\n", company.name, audits.len());
            for audit in &audits {
                let _ = writeln!(
                    output,
                    "- {} | score {} | perf {} | a11y {} | seo {} | {} issues | {} ({})",
                    audit.created_at,
                    audit.audit.score,
                    audit.audit.performance_score,
                    audit.audit.accessibility_score,
                    audit.audit.seo_score,
                    audit.audit.issues.len(),
                    audit.audit.url,
                    audit.id
                );
            }
            ToolResult::text(output)
        }
        Err(e) => ToolResult::error(format!("Failed to load audits: {}", e)),
    }
}

async fn handle_companies(service: &AuditService) -> ToolResult {
    match service.store().list_companies().await {
        Ok(companies) if companies.is_empty() => ToolResult::text(
            "No companies registered. Use 'sitescore company add' to register one.",
        ),
        Ok(companies) => {
            let mut output = format!("Registered companies ({}):\n\n", companies.len());
            for company in &companies {
                let _ = writeln!(
                    output,
                    "- **{}** [{}]\n  - Website: {}\n  - Industry: {}",
                    company.name,
                    company.id,
                    company.website,
                    company.industry.as_deref().unwrap_or("unknown")
                );
            }
            ToolResult::text(output)
        }
        Err(e) => ToolResult::error(format!("Failed to list companies: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapters;
    use crate::audit::BasicAuditor;
    use crate::config::FetchConfig;
    use crate::mcp::types::ToolContent;
    use crate::store::AuditDb;
    use tempfile::TempDir;

    async fn service() -> (AuditService, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = AuditDb::open(&tmp.path().join("tools.db")).await.unwrap();
        let basic = BasicAuditor::new(&FetchConfig::default()).unwrap();
        (
            AuditService::new(store, Adapters::default(), basic, Strategy::Mobile),
            tmp,
        )
    }

    fn text(result: &ToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let (service, _tmp) = service().await;
        let result = handle_tool_call("seo_audit", &Map::new(), &service).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Missing required parameter: url");

        let result = handle_tool_call("seo_audit_history", &Map::new(), &service).await;
        assert_eq!(text(&result), "Missing required parameter: company_id");

        let result = handle_tool_call("nope", &Map::new(), &service).await;
        assert_eq!(text(&result), "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_audit_unreachable_url_reports_hints() {
        let (service, _tmp) = service().await;
        let mut args = Map::new();
        args.insert("url".to_string(), json!("http://127.0.0.1:1/"));
        let result = handle_tool_call("seo_audit", &args, &service).await;
        assert_eq!(result.is_error, None);
        assert!(text(&result).contains("connectivity"));
        assert!(text(&result).contains("## Next steps"));
    }

    #[tokio::test]
    async fn test_history_for_unknown_company() {
        let (service, _tmp) = service().await;
        let mut args = Map::new();
        args.insert("company_id".to_string(), json!("ghost"));
        let result = handle_tool_call("seo_comprehensive_audit", &args, &service).await;
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("Company not found"));
    }
}
