//! # 对账与审批端到端流程测试

mod common;

use entity::PriceRecords;
use pretty_assertions::assert_eq;
use sea_orm::{EntityTrait, PaginatorTrait};

use common::{candidate, contributor, crawler, moderator, setup_cache, setup_db};
use price_hub::approval::ApprovalWorkflow;
use price_hub::pricing::PriceDimension;
use price_hub::reconcile::{ReconcileAction, ReconciliationEngine};
use price_hub::types::TrustLevel;

#[tokio::test]
async fn test_gpt5_trusted_create_untrusted_proposal_then_approve() {
    let db = setup_db().await;
    let cache = setup_cache();
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());
    let approval = ApprovalWorkflow::new(db.clone(), cache);

    // 官网数据源直接写入正式值
    let mut official = candidate(1, "gpt-5", 1.25, 10.0);
    official.extended.set(PriceDimension::Cached, 0.125);
    let created = engine
        .reconcile(&official, TrustLevel::Trusted, &crawler())
        .await
        .unwrap();
    assert_eq!(created.action, ReconcileAction::Created);
    let record = created.record.unwrap();
    assert_eq!(record.status, "approved");
    assert_eq!(record.cached_tokens, Some(0.125));

    // 三方数据源只改了输出价格
    let mut third_party = official.clone();
    third_party.output_price = 11.0;
    third_party.price_source = "三方API".to_string();
    let proposed = engine
        .reconcile(&third_party, TrustLevel::Untrusted, &crawler())
        .await
        .unwrap();
    assert_eq!(proposed.action, ReconcileAction::Proposed);
    let pending = proposed.record.unwrap();
    assert_eq!(pending.status, "pending");
    assert_eq!(pending.output_price, 10.0);
    assert_eq!(pending.temp_output_price, Some(11.0));
    assert_eq!(pending.temp_input_price, None);
    assert_eq!(pending.temp_price_source.as_deref(), Some("三方API"));
    assert_eq!(pending.temp_model, None);

    // 同一提议再次到达不会产生写入
    let again = engine
        .reconcile(&third_party, TrustLevel::Untrusted, &crawler())
        .await
        .unwrap();
    assert_eq!(again.action, ReconcileAction::Unchanged);

    let approved = approval.approve_one(pending.id).await.unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(approved.input_price, 1.25);
    assert_eq!(approved.output_price, 11.0);
    assert_eq!(approved.price_source, "三方API");
    assert_eq!(approved.cached_tokens, Some(0.125));
    assert_eq!(approved.temp_output_price, None);
    assert_eq!(approved.updated_by.as_deref(), Some("cron自动任务"));

    assert_eq!(PriceRecords::find().count(db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_dropped_dimension_goes_through_review() {
    let db = setup_db().await;
    let cache = setup_cache();
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());
    let approval = ApprovalWorkflow::new(db.clone(), cache);

    let mut official = candidate(1, "gpt-4.1", 2.0, 8.0);
    official.extended.set(PriceDimension::Cached, 0.5);
    engine
        .reconcile(&official, TrustLevel::Trusted, &crawler())
        .await
        .unwrap();

    // 三方数据源不再报告缓存价格
    let without_cache = candidate(1, "gpt-4.1", 2.0, 8.0);
    let proposed = engine
        .reconcile(&without_cache, TrustLevel::Untrusted, &crawler())
        .await
        .unwrap();
    assert_eq!(proposed.action, ReconcileAction::Proposed);
    let pending = proposed.record.unwrap();
    assert_eq!(pending.cached_tokens, Some(0.5));
    assert_eq!(pending.temp_cleared_dimensions.as_deref(), Some("cached_tokens"));

    let approved = approval.approve_one(pending.id).await.unwrap();
    assert_eq!(approved.cached_tokens, None);
    assert_eq!(approved.output_price, 8.0);

    let again = engine
        .reconcile(&without_cache, TrustLevel::Untrusted, &crawler())
        .await
        .unwrap();
    assert_eq!(again.action, ReconcileAction::Unchanged);
}

#[tokio::test]
async fn test_repeated_observation_is_idempotent() {
    let db = setup_db().await;
    let engine = ReconciliationEngine::new(db.clone(), setup_cache());
    let observed = candidate(20, "gemini-2.5-pro", 1.25, 10.0);

    for trust in [TrustLevel::Trusted, TrustLevel::Untrusted] {
        let first = engine.reconcile(&observed, trust, &crawler()).await.unwrap();
        let before = PriceRecords::find_by_id(first.record.unwrap().id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();

        let second = engine.reconcile(&observed, trust, &crawler()).await.unwrap();
        assert!(!second.applied());

        let after = PriceRecords::find_by_id(before.id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_actor_level_decides_live_write() {
    let db = setup_db().await;
    let engine = ReconciliationEngine::new(db.clone(), setup_cache());
    engine
        .reconcile(&candidate(14, "claude-sonnet-4-5", 3.0, 15.0), TrustLevel::Trusted, &crawler())
        .await
        .unwrap();

    let cheaper = candidate(14, "claude-sonnet-4-5", 2.0, 15.0);
    let staged = engine
        .reconcile(&cheaper, TrustLevel::Untrusted, &contributor())
        .await
        .unwrap();
    assert_eq!(staged.action, ReconcileAction::Proposed);

    // 版主直接覆盖正式值，并清掉旧的待审核差异
    let live = engine
        .reconcile(&cheaper, TrustLevel::Untrusted, &moderator())
        .await
        .unwrap();
    assert_eq!(live.action, ReconcileAction::Updated);
    let record = live.record.unwrap();
    assert_eq!(record.status, "approved");
    assert_eq!(record.input_price, 2.0);
    assert_eq!(record.temp_input_price, None);
    assert_eq!(record.updated_by.as_deref(), Some("moderator"));
}

#[tokio::test]
async fn test_concurrent_new_submissions_create_one_record() {
    let db = setup_db().await;
    let engine = std::sync::Arc::new(ReconciliationEngine::new(db.clone(), setup_cache()));
    let observed = candidate(25, "gemini-3-pro", 2.0, 12.0);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let observed = observed.clone();
            tokio::spawn(async move {
                engine
                    .reconcile(&observed, TrustLevel::Untrusted, &crawler())
                    .await
                    .unwrap()
                    .action
            })
        })
        .collect();

    let mut actions = Vec::new();
    for handle in handles {
        actions.push(handle.await.unwrap());
    }
    assert_eq!(
        actions
            .iter()
            .filter(|a| **a == ReconcileAction::Submitted)
            .count(),
        1
    );
    assert_eq!(PriceRecords::find().count(db.as_ref()).await.unwrap(), 1);
}
