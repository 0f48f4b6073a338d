//! # 采集周期集成测试
//!
//! 用 wiremock 模拟三个外部数据源

mod common;

use entity::{PriceRecords, price_records};
use pretty_assertions::assert_eq;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::setup_db;
use price_hub::app::AppContext;
use price_hub::config::AppConfig;
use price_hub::types::target_key;

const PRICING_PAGE: &str = r#"
<html><body>
  <div data-content-switcher-pane data-value="standard">
    <table>
      <thead><tr><th>Model</th><th>Input</th><th>Cached input</th><th>Output</th></tr></thead>
      <tbody>
        <tr><td>gpt-5</td><td>$1.25</td><td>$0.125</td><td>$10.00</td></tr>
        <tr><td>gpt-4o-mini</td><td>$0.15</td><td>-</td><td>$0.60</td></tr>
      </tbody>
    </table>
  </div>
</body></html>
"#;

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.ingestion.inter_adapter_delay_secs = 0;
    config.ingestion.request_timeout_secs = 5;
    config.sources.openrouter_models.url = format!("{}/api/frontend/models", server.uri());
    config.sources.openrouter.url = format!("{}/api/frontend/models", server.uri());
    config.sources.openai.url = format!("{}/pricing", server.uri());
    config.sources.siliconflow.url = format!("{}/playground", server.uri());
    config.sources.siliconflow.api_key = Some("sk-test".to_string());
    config
}

async fn mount_openrouter(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/frontend/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "slug": "anthropic/claude-3.5-sonnet",
                    "modality": "text+image->text",
                    "pricing": {"prompt": "0.000001", "completion": "0.000002"},
                    "endpoint": {"pricing": {"prompt": "0.000003", "completion": "0.000015"}}
                },
                {"slug": "openai/gpt-5", "modality": "text->text",
                 "pricing": {"prompt": "0.00000125", "completion": "0.000011"}}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_siliconflow(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/playground"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 20000,
            "message": "ok",
            "status": true,
            "data": {"models": [
                {"modelName": "deepseek-ai/DeepSeek-V3", "price": "2", "priceUnit": "/ M Tokens",
                 "type": "text", "subType": "chat"}
            ]}
        })))
        .mount(server)
        .await;
}

async fn find(db: &sea_orm::DatabaseConnection, channel: i32, model: &str) -> price_records::Model {
    PriceRecords::find()
        .filter(price_records::Column::TargetKey.eq(target_key(channel, model)))
        .one(db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("missing record {channel}:{model}"))
}

#[tokio::test]
async fn test_full_cycle_against_mock_sources() {
    let server = MockServer::start().await;
    mount_openrouter(&server).await;
    mount_siliconflow(&server).await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRICING_PAGE))
        .mount(&server)
        .await;

    let db = setup_db().await;
    let context = AppContext::build(config_for(&server), db.clone()).unwrap();

    let report = context.ingestion.run_ingestion_cycle().await.unwrap();
    let sources: Vec<_> = report.adapters.iter().map(|a| a.source.as_str()).collect();
    assert_eq!(
        sources,
        vec!["openrouter_models", "openrouter", "openai", "siliconflow"]
    );
    assert!(report.failed_sources().is_empty());

    // OpenRouter 自身渠道按原始标识直接写入
    assert_eq!(report.adapters[0].actions.created, 2);
    // 厂商改写后两条都是全新待审核记录
    assert_eq!(report.adapters[1].actions.submitted, 2);
    // 官网随后到达，gpt-5 已有待审核提交，gpt-4o-mini 直接通过
    assert_eq!(report.adapters[2].actions.duplicate_in_flight, 1);
    assert_eq!(report.adapters[2].actions.created, 1);
    assert_eq!(report.adapters[3].actions.submitted, 1);

    let listed = find(&db, 20, "anthropic/claude-3.5-sonnet").await;
    assert_eq!(listed.status, "approved");
    assert_eq!(listed.input_price, 3.0);
    assert_eq!(listed.output_price, 15.0);
    assert_eq!(listed.price_source, "https://openrouter.ai/models");
    assert_eq!(find(&db, 20, "openai/gpt-5").await.output_price, 11.0);

    let claude = find(&db, 14, "claude-3-5-sonnet").await;
    assert_eq!(claude.status, "pending");
    assert_eq!(claude.temp_input_price, Some(3.0));
    assert_eq!(claude.temp_output_price, Some(15.0));

    let mini = find(&db, 1, "gpt-4o-mini").await;
    assert_eq!(mini.status, "approved");
    assert_eq!(mini.price_source, format!("{}/pricing", server.uri()));

    let deepseek = find(&db, 45, "deepseek-ai/DeepSeek-V3").await;
    assert_eq!(deepseek.temp_currency.as_deref(), Some("CNY"));
    assert_eq!(deepseek.temp_input_price, Some(2.0));
    assert_eq!(deepseek.temp_output_price, Some(2.0));

    // 第二轮没有任何写入
    let second = context.ingestion.run_ingestion_cycle().await.unwrap();
    assert_eq!(second.total_written(), 0);
}

#[tokio::test]
async fn test_failing_source_does_not_abort_cycle() {
    let server = MockServer::start().await;
    mount_openrouter(&server).await;
    mount_siliconflow(&server).await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let db = setup_db().await;
    let context = AppContext::build(config_for(&server), db.clone()).unwrap();

    let report = context.ingestion.run_ingestion_cycle().await.unwrap();
    assert_eq!(report.failed_sources(), vec!["openai"]);
    assert_eq!(report.adapters[3].actions.submitted, 1);

    let status = context.ingestion.status().get("openai").unwrap();
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_error.unwrap().contains("503"));
}

#[tokio::test]
async fn test_wrong_token_fails_only_siliconflow() {
    let server = MockServer::start().await;
    mount_openrouter(&server).await;
    mount_siliconflow(&server).await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRICING_PAGE))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.sources.siliconflow.api_key = Some("sk-wrong".to_string());
    let context = AppContext::build(config, setup_db().await).unwrap();

    let report = context.ingestion.run_ingestion_cycle().await.unwrap();
    assert_eq!(report.failed_sources(), vec!["siliconflow"]);
}
