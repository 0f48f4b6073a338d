//! # OpenAI 官网定价页数据源
//!
//! 只解析 Standard 档位下第一张 `Model / Input / Cached* / Output` 四列表格，
//! 页面价格本身就是每百万 tokens 的美元价格。

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use super::{SkipReason, SourceAdapter, SourceBatch, build_http_client, ensure_success};
use crate::config::OfficialPageSourceConfig;
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::normalizer::Normalizer;
use crate::pricing::{ExtendedPrices, PriceCandidate, PriceDimension, round_to};
use crate::types::{BillingType, CURRENCY_USD, ChannelId, TrustLevel};
use crate::{ldebug, linfo};

const SOURCE_NAME: &str = "openai";
const OPENAI_CHANNEL: ChannelId = 1;
const TEXT_CATEGORY: &str = "text->text";

/// 页面中的一行价格
#[derive(Debug, Clone, PartialEq)]
pub struct PageRow {
    pub model: String,
    pub input: f64,
    pub cached: f64,
    pub output: f64,
}

/// 解析 `"$2.50"` 形式的价格，`-`、`—` 与空白视为 0
pub fn parse_dollar_price(cell: &str) -> std::result::Result<f64, SkipReason> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "—" {
        return Ok(0.0);
    }
    let number = trimmed.trim_start_matches('$').trim().replace(',', "");
    let price: f64 = number
        .parse()
        .map_err(|_| SkipReason::InvalidPrice(cell.to_string()))?;
    if !price.is_finite() || price < 0.0 {
        return Err(SkipReason::InvalidPrice(cell.to_string()));
    }
    Ok(round_to(price, 6))
}

struct PageSelectors {
    standard_pane: Selector,
    table: Selector,
    thead: Selector,
    th: Selector,
    tbody: Selector,
    tr: Selector,
    td: Selector,
}

impl PageSelectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| HubError::parse(format!("选择器无效 {css}: {e}")))
        };
        Ok(Self {
            standard_pane: parse(r#"[data-content-switcher-pane][data-value="standard"]"#)?,
            table: parse("table")?,
            thead: parse("thead")?,
            th: parse("th")?,
            tbody: parse("tbody")?,
            tr: parse("tr")?,
            td: parse("td")?,
        })
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 表头是否为 `[model, input, *cached*, output]`
fn is_text_token_header(headers: &[String]) -> bool {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    matches!(
        lower.as_slice(),
        [model, input, cached, output]
            if model == "model" && input == "input" && cached.contains("cached") && output == "output"
    )
}

/// 从页面中提取价格表，行级错误记入 `skipped`
pub fn parse_pricing_page(html: &str, skipped: &mut Vec<(String, SkipReason)>) -> Result<Vec<PageRow>> {
    let selectors = PageSelectors::new()?;
    let document = Html::parse_document(html);

    let mut found_pane = false;
    for pane in document.select(&selectors.standard_pane) {
        found_pane = true;
        for table in pane.select(&selectors.table) {
            let headers: Vec<String> = table
                .select(&selectors.thead)
                .next()
                .map(|thead| thead.select(&selectors.th).map(text_of).collect())
                .unwrap_or_default();
            if !is_text_token_header(&headers) {
                continue;
            }

            let Some(tbody) = table.select(&selectors.tbody).next() else {
                continue;
            };

            let mut rows = Vec::new();
            for tr in tbody.select(&selectors.tr) {
                let cells: Vec<String> = tr.select(&selectors.td).map(text_of).collect();
                if cells.len() < 4 || cells[0].is_empty() {
                    continue;
                }
                let model = cells[0].clone();
                let parsed = parse_dollar_price(&cells[1])
                    .and_then(|input| parse_dollar_price(&cells[3]).map(|output| (input, output)));
                match parsed {
                    Ok((input, output)) => rows.push(PageRow {
                        cached: parse_dollar_price(&cells[2]).unwrap_or(0.0),
                        model,
                        input,
                        output,
                    }),
                    Err(reason) => skipped.push((model, reason)),
                }
            }

            if !rows.is_empty() {
                return Ok(rows);
            }
        }
    }

    if found_pane {
        Err(HubError::source_failure(
            SOURCE_NAME,
            "未找到 Standard 档位的文本 token 价格表格",
        ))
    } else {
        Err(HubError::source_failure(
            SOURCE_NAME,
            "未找到 Standard 档位的价格面板",
        ))
    }
}

/// OpenAI 官网定价页数据源
pub struct OpenAiPricingPageAdapter {
    client: reqwest::Client,
    url: String,
    normalizer: Arc<Normalizer>,
}

impl OpenAiPricingPageAdapter {
    pub fn new(
        config: &OfficialPageSourceConfig,
        timeout: Duration,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout, Some(&config.user_agent))?,
            url: config.url.clone(),
            normalizer,
        })
    }

    /// 把页面内容转换为候选价格
    pub fn parse_page(&self, html: &str) -> Result<SourceBatch> {
        let mut row_errors = Vec::new();
        let rows = parse_pricing_page(html, &mut row_errors)?;

        let mut batch = SourceBatch::default();
        for (model, reason) in row_errors {
            batch.skip(model, reason);
        }

        for row in rows {
            let normalized =
                match self
                    .normalizer
                    .normalize_listing(&row.model, OPENAI_CHANNEL, TEXT_CATEGORY)
                {
                    Ok(normalized) => normalized,
                    Err(rejection) => {
                        ldebug!(
                            "system",
                            LogStage::Normalization,
                            LogComponent::SourceAdapter,
                            "skip_model",
                            format!("跳过模型 {}: {rejection}", row.model)
                        );
                        batch.skip(row.model, rejection);
                        continue;
                    }
                };

            let mut extended = ExtendedPrices::new();
            if row.cached > 0.0 {
                extended.set(PriceDimension::Cached, row.cached);
            }

            let candidate = PriceCandidate {
                model: normalized.canonical_model,
                model_type: normalized.model_type,
                billing_type: BillingType::Tokens,
                channel_type: normalized.channel_id,
                currency: CURRENCY_USD.to_string(),
                input_price: row.input,
                output_price: row.output,
                price_source: self.url.clone(),
                extended,
            };
            batch.observe(row.model, candidate);
        }

        Ok(batch)
    }
}

#[async_trait]
impl SourceAdapter for OpenAiPricingPageAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn trust_level(&self) -> TrustLevel {
        TrustLevel::Trusted
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            HubError::source_failure_with_cause(SOURCE_NAME, "请求定价页面失败", e)
        })?;
        ensure_success(SOURCE_NAME, &response)?;
        let body = response.text().await.map_err(|e| {
            HubError::source_failure_with_cause(SOURCE_NAME, "读取响应失败", e)
        })?;

        let batch = self.parse_page(&body)?;
        linfo!(
            "system",
            LogStage::Ingestion,
            LogComponent::SourceAdapter,
            "fetch_complete",
            "OpenAI 官网价格解析完成",
            observations = batch.observations.len(),
            skipped = batch.skipped.len()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><body>
          <div data-content-switcher-pane data-value="batch">
            <table>
              <thead><tr><th>Model</th><th>Input</th><th>Cached input</th><th>Output</th></tr></thead>
              <tbody><tr><td>gpt-5</td><td>$0.625</td><td>$0.0625</td><td>$5.00</td></tr></tbody>
            </table>
          </div>
          <div data-content-switcher-pane data-value="standard">
            <table>
              <thead><tr><th>Model</th><th>Training</th><th>Input</th><th>Output</th></tr></thead>
              <tbody><tr><td>gpt-4.1</td><td>$25.00</td><td>$3.00</td><td>$12.00</td></tr></tbody>
            </table>
            <table>
              <thead><tr><th> Model </th><th>INPUT</th><th>Cached input</th><th>Output</th></tr></thead>
              <tbody>
                <tr><td>gpt-5</td><td>$1.25</td><td>$0.125</td><td>$10.00</td></tr>
                <tr><td>gpt-4o-mini</td><td>$0.15</td><td>-</td><td>$0.60</td></tr>
                <tr><td>o1-pro</td><td>$150.00</td><td>—</td><td>$600.00</td></tr>
                <tr><td>o3-mini-high</td><td>$1.10</td><td>$0.55</td><td>$4.40</td></tr>
                <tr><td>broken</td><td>call us</td><td></td><td>$1</td></tr>
              </tbody>
            </table>
          </div>
        </body></html>
    "#;

    fn adapter() -> OpenAiPricingPageAdapter {
        OpenAiPricingPageAdapter::new(
            &OfficialPageSourceConfig::default(),
            Duration::from_secs(5),
            Arc::new(Normalizer::new().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_dollar_price() {
        assert_eq!(parse_dollar_price("$2.50"), Ok(2.5));
        assert_eq!(parse_dollar_price(" - "), Ok(0.0));
        assert_eq!(parse_dollar_price("—"), Ok(0.0));
        assert_eq!(parse_dollar_price(""), Ok(0.0));
        assert_eq!(parse_dollar_price("$1,000.00"), Ok(1000.0));
        assert!(parse_dollar_price("call us").is_err());
    }

    #[test]
    fn test_parse_standard_table() {
        let batch = adapter().parse_page(PAGE).unwrap();

        let rows: Vec<_> = batch
            .observations
            .iter()
            .map(|o| {
                (
                    o.candidate.model.as_str(),
                    o.candidate.input_price,
                    o.candidate.output_price,
                    o.candidate.extended.get(PriceDimension::Cached),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("gpt-5", 1.25, 10.0, Some(0.125)),
                ("gpt-4o-mini", 0.15, 0.6, None),
                ("o1-pro", 150.0, 600.0, None),
            ]
        );
        assert!(batch.observations.iter().all(|o| o.candidate.channel_type == 1));

        let skipped: Vec<_> = batch.skipped.iter().map(|s| s.raw_id.as_str()).collect();
        assert_eq!(skipped, vec!["broken", "o3-mini-high"]);
    }

    #[test]
    fn test_missing_pane_is_source_failure() {
        let err = adapter()
            .parse_page("<html><body><table></table></body></html>")
            .unwrap_err();
        assert!(matches!(err, HubError::Source { .. }));
    }

    #[test]
    fn test_missing_table_is_source_failure() {
        let html = r#"<div data-content-switcher-pane data-value="standard"><p>soon</p></div>"#;
        let err = adapter().parse_page(html).unwrap_err();
        assert!(err.to_string().contains("表格"));
    }
}
