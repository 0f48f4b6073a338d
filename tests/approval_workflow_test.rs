//! # 审批流程集成测试

mod common;

use entity::PriceRecords;
use pretty_assertions::assert_eq;
use sea_orm::EntityTrait;

use common::{candidate, crawler, setup_cache, setup_db};
use price_hub::HubError;
use price_hub::approval::{ApprovalWorkflow, RejectOutcome};
use price_hub::reconcile::ReconciliationEngine;
use price_hub::types::TrustLevel;

#[tokio::test]
async fn test_reject_restores_confirmed_and_deletes_new_submissions() {
    let db = setup_db().await;
    let cache = setup_cache();
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());
    let approval = ApprovalWorkflow::new(db.clone(), cache);

    let existing = engine
        .reconcile(&candidate(1, "gpt-4.1", 2.0, 8.0), TrustLevel::Trusted, &crawler())
        .await
        .unwrap()
        .record
        .unwrap();
    let proposal = engine
        .reconcile(&candidate(1, "gpt-4.1", 2.0, 9.0), TrustLevel::Untrusted, &crawler())
        .await
        .unwrap()
        .record
        .unwrap();
    assert_eq!(proposal.id, existing.id);

    let fresh = engine
        .reconcile(&candidate(17, "qwen3-max", 1.2, 6.0), TrustLevel::Untrusted, &crawler())
        .await
        .unwrap()
        .record
        .unwrap();
    assert_eq!(fresh.model, "");

    let outcomes = approval.reject_all().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&RejectOutcome::Deleted));

    let remaining = PriceRecords::find().all(db.as_ref()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    let reverted = &remaining[0];
    assert_eq!(reverted.status, "approved");
    assert_eq!(reverted.output_price, 8.0);
    assert_eq!(reverted.temp_output_price, None);
    assert_eq!(reverted.proposed_by, None);
}

#[tokio::test]
async fn test_approve_all_then_nothing_pending() {
    let db = setup_db().await;
    let cache = setup_cache();
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());
    let approval = ApprovalWorkflow::new(db.clone(), cache);

    for (channel, model) in [(14, "claude-opus-4-1"), (25, "gemini-2.5-flash"), (45, "Qwen/Qwen3-8B")] {
        engine
            .reconcile(&candidate(channel, model, 1.0, 2.0), TrustLevel::Untrusted, &crawler())
            .await
            .unwrap();
    }

    let approved = approval.approve_all().await.unwrap();
    assert_eq!(approved.len(), 3);
    assert!(approved.iter().all(|r| r.status == "approved" && r.temp_model.is_none()));
    assert!(approved.iter().any(|r| r.model == "Qwen/Qwen3-8B" && r.channel_type == 45));

    assert!(approval.approve_all().await.unwrap().is_empty());
    assert!(matches!(
        approval.approve_one(approved[0].id).await,
        Err(HubError::Business { .. })
    ));
}
