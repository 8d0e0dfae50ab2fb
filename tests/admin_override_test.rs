mod common;

use chrono::Duration;
use common::*;
use paysettle::domain::refund::RefundStatus;
use paysettle::domain::transaction::{TransactionPatch, TransactionStatus};
use paysettle::error::PaymentError;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_update_bypasses_transition_guards() {
    let mut t = engine();
    let tx = t.engine.submit(card_purchase(dec!(60.00))).await.unwrap();
    t.engine.transactions().cancel(tx.id).await.unwrap();
    t.drain_events();

    t.clock.advance(Duration::minutes(10));
    let patched = t
        .engine
        .admin()
        .update_transaction(
            tx.id,
            TransactionPatch {
                status: Some(TransactionStatus::Refunded),
                notes: Some("refunded by support".to_string()),
                attempt_count: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.status, TransactionStatus::Refunded);
    assert_eq!(patched.notes.as_deref(), Some("refunded by support"));
    assert_eq!(patched.attempt_count, 0);
    assert_eq!(patched.updated_at, Some(start() + Duration::minutes(10)));
    assert_eq!(patched.id, tx.id);
    assert_eq!(patched.reference, tx.reference);
    assert_eq!(patched.amount, tx.amount);
    assert_eq!(patched.created_at, tx.created_at);
    assert_eq!(t.engine.transactions().get(tx.id).await.unwrap(), patched);
    assert!(t.drain_events().is_empty());
}

#[tokio::test]
async fn test_update_unknown_transaction() {
    let t = engine();
    let result = t
        .engine
        .admin()
        .update_transaction(
            Uuid::new_v4(),
            TransactionPatch {
                notes: Some("x".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(PaymentError::NotFoundError(_))));
}

#[tokio::test]
async fn test_force_refund_status() {
    let t = engine();
    let tx = t.engine.submit(card_purchase(dec!(60.00))).await.unwrap();
    let refund = t
        .engine
        .refunds()
        .request(refund_of(&tx, dec!(60.00)))
        .await
        .unwrap();
    t.engine.refunds().cancel(refund.id).await.unwrap();

    let forced = t
        .engine
        .admin()
        .set_refund_status(refund.id, RefundStatus::Completed)
        .await
        .unwrap();
    assert_eq!(forced.status, RefundStatus::Completed);
    assert_eq!(forced.refund_amount, refund.refund_amount);

    let missing = t
        .engine
        .admin()
        .set_refund_status(Uuid::new_v4(), RefundStatus::UnderReview)
        .await;
    assert!(matches!(missing, Err(PaymentError::NotFoundError(_))));
}

#[tokio::test]
async fn test_soft_delete_hides_transaction() {
    let t = engine();
    let tx = t.engine.submit(card_purchase(dec!(60.00))).await.unwrap();
    let other = t.engine.submit(card_purchase(dec!(5.00))).await.unwrap();

    t.engine.admin().delete_transaction(tx.id).await.unwrap();

    assert!(matches!(
        t.engine.transactions().get(tx.id).await,
        Err(PaymentError::NotFoundError(_))
    ));
    assert!(matches!(
        t.engine.transactions().get_by_reference(&tx.reference).await,
        Err(PaymentError::NotFoundError(_))
    ));
    assert_eq!(
        t.engine.transactions().list_all().await.unwrap(),
        vec![other]
    );
    assert!(
        t.engine
            .transactions()
            .by_user(tx.user_id)
            .await
            .unwrap()
            .is_empty()
    );

    let refund = t.engine.refunds().request(refund_of(&tx, dec!(1.00))).await;
    assert!(matches!(refund, Err(PaymentError::NotFoundError(_))));

    let again = t.engine.admin().delete_transaction(tx.id).await;
    assert!(matches!(again, Err(PaymentError::NotFoundError(_))));
}

#[tokio::test]
async fn test_delete_refund() {
    let t = engine();
    let tx = t.engine.submit(card_purchase(dec!(60.00))).await.unwrap();
    let refund = t
        .engine
        .refunds()
        .request(refund_of(&tx, dec!(60.00)))
        .await
        .unwrap();

    t.engine.admin().delete_refund(refund.id).await.unwrap();
    assert!(matches!(
        t.engine.refunds().get(refund.id).await,
        Err(PaymentError::NotFoundError(_))
    ));

    // the deleted refund no longer counts against the ceiling
    t.engine
        .refunds()
        .request(refund_of(&tx, dec!(60.00)))
        .await
        .unwrap();

    let again = t.engine.admin().delete_refund(refund.id).await;
    assert!(matches!(again, Err(PaymentError::NotFoundError(_))));
}
