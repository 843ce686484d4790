mod common;

use studiobook::{
    auth::AuthService,
    domain::*,
    error::AppError,
    repository::*,
};

use common::*;

#[tokio::test]
async fn test_user_accounts_and_roles() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let hash = AuthService::hash_password("correct horse")?;
    let user = repo.create("studio@example.com", "Studio Owner", &hash).await?;
    assert_eq!(user.email, "studio@example.com");

    let found = repo.find_by_email("studio@example.com").await?;
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let stored = repo.password_hash("studio@example.com").await?.unwrap();
    assert!(AuthService::verify_password("correct horse", &stored)?);

    assert!(repo.roles(user.id).await?.is_empty());
    repo.grant_role(user.id, Role::User).await?;
    repo.grant_role(user.id, Role::Admin).await?;
    // Granting twice is harmless.
    repo.grant_role(user.id, Role::Admin).await?;

    let roles = repo.roles(user.id).await?;
    assert_eq!(roles.len(), 2);
    assert_eq!(Role::highest(&roles), Role::Admin);

    let duplicate = repo.create("studio@example.com", "Someone Else", &hash).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn test_booking_crud_and_stats() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let user = create_user(&pool, "ada@example.com").await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let mut request = new_booking(&user, 80_000, BookingStatus::Pending, None);
    request.couples = true;
    request.uploaded_images = vec![UploadedImage {
        name: "mood.jpg".to_string(),
        url: "/uploads/x/mood.jpg".to_string(),
    }];
    let booking = repo.create(request).await?;

    assert_eq!(booking.package_price, 80_000);
    assert!(booking.couples);
    assert_eq!(booking.uploaded_images.len(), 1);
    assert_eq!(booking.uploaded_images[0].name, "mood.jpg");
    assert_eq!(booking.booking_date, tomorrow());

    repo.create(new_booking(&user, 70_000, BookingStatus::PaymentPending, Some("bk_a"))).await?;
    repo.create(new_booking(&user, 35_000, BookingStatus::Cancelled, None)).await?;

    let mine = repo.list_by_user(user.id).await?;
    assert_eq!(mine.len(), 3);

    let page = repo.list(2, 0).await?;
    assert_eq!(page.len(), 2);

    let updated = repo.update_status(booking.id, BookingStatus::Completed).await?;
    assert_eq!(updated.status, BookingStatus::Completed);

    let stats = repo.stats().await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.payment_pending, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.pending, 0);

    let missing = repo.update_status(uuid::Uuid::new_v4(), BookingStatus::Confirmed).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_awaiting_payment_lookups() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let user = create_user(&pool, "ada@example.com").await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let waiting = repo
        .create(new_booking(&user, 70_000, BookingStatus::PaymentPending, Some("bk_wait")))
        .await?;
    repo.create(new_booking(&user, 70_000, BookingStatus::Confirmed, Some("bk_done")))
        .await?;

    let by_ref = repo.find_awaiting_payment_by_reference("bk_wait").await?;
    assert_eq!(by_ref.map(|b| b.id), Some(waiting.id));
    assert!(repo.find_awaiting_payment_by_reference("bk_done").await?.is_none());

    let by_price = repo.find_awaiting_payment_by_price(70_000).await?;
    assert_eq!(by_price.len(), 1);
    assert_eq!(by_price[0].id, waiting.id);

    Ok(())
}

#[tokio::test]
async fn test_payment_record_confirms_booking_atomically() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let user = create_user(&pool, "ada@example.com").await?;
    let bookings = SqliteBookingRepository::new(pool.clone());
    let payments = SqlitePaymentRepository::new(pool.clone());

    let booking = bookings
        .create(new_booking(&user, 70_000, BookingStatus::Pending, None))
        .await?;

    let payment = NewPayment {
        booking_id: Some(booking.id),
        reference: "ref_atomic".to_string(),
        amount_minor: 7_000_000,
        currency: "NGN".to_string(),
        customer_email: None,
        channel: None,
        status: "success".to_string(),
        gateway_response: None,
        paid_at: None,
    };

    // The booking is not awaiting payment, so neither write may land.
    let result = payments.record(payment.clone()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(payments.find_by_reference("ref_atomic").await?.is_none());

    bookings.update_status(booking.id, BookingStatus::PaymentPending).await?;
    let recorded = payments.record(payment.clone()).await?;
    assert_eq!(recorded.booking_id, Some(booking.id));

    let booking = bookings.find_by_id(booking.id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);

    let replay = payments
        .record(NewPayment {
            booking_id: None,
            ..payment
        })
        .await;
    assert!(matches!(replay, Err(AppError::Conflict(_))));
    assert_eq!(payments.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_transfer_lifecycle() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let admin = create_user(&pool, "owner@example.com").await?;
    let repo = SqliteTransferRepository::new(pool.clone());

    let zed = repo
        .create_recipient(NewRecipient {
            recipient_code: "RCP_zed".to_string(),
            name: "Zed Photos".to_string(),
            email: "zed@example.com".to_string(),
            bank_name: "Access Bank".to_string(),
            bank_code: "044".to_string(),
            account_number: "0001112223".to_string(),
            account_name: None,
        })
        .await?;
    repo.create_recipient(NewRecipient {
        recipient_code: "RCP_amy".to_string(),
        name: "Amy Lights".to_string(),
        email: "amy@example.com".to_string(),
        bank_name: "Guaranty Trust Bank".to_string(),
        bank_code: "058".to_string(),
        account_number: "0123456789".to_string(),
        account_name: Some("AMY LIGHTS".to_string()),
    })
    .await?;

    let names: Vec<String> = repo
        .list_active_recipients()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Amy Lights", "Zed Photos"]);

    let transfer = repo
        .create_transfer(NewTransfer {
            recipient: zed,
            amount: 25_000,
            reference: "tx_1_abcdefghi".to_string(),
            initiated_by: admin.id,
        })
        .await?;
    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(transfer.bank_name, "Access Bank");

    let updated = repo
        .update_transfer(transfer.id, TransferStatus::Otp, Some("TRF_1".to_string()), None)
        .await?;
    assert_eq!(updated.status, TransferStatus::Otp);
    assert_eq!(updated.transfer_code.as_deref(), Some("TRF_1"));

    // A later update without a code keeps the stored one.
    let failed = repo
        .update_transfer(transfer.id, TransferStatus::Failed, None, Some("Declined".to_string()))
        .await?;
    assert_eq!(failed.transfer_code.as_deref(), Some("TRF_1"));
    assert_eq!(failed.failure_reason.as_deref(), Some("Declined"));

    let found = repo.find_transfer_by_reference("tx_1_abcdefghi").await?;
    assert_eq!(found.map(|t| t.status), Some(TransferStatus::Failed));
    assert_eq!(repo.list_transfers(10, 0).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_sessions() -> anyhow::Result<()> {
    let pool = setup_pool().await?;
    let user = create_user(&pool, "ada@example.com").await?;
    let auth = AuthService::new(pool.clone(), 24, false);

    let (session, token) = auth.create_session(user.id).await?;
    assert_eq!(session.user_id, user.id);
    assert!(session.expires_at > chrono::Utc::now() + chrono::Duration::hours(23));

    let found = auth.validate_session(&token).await?.unwrap();
    assert_eq!(found.id, session.id);
    assert_eq!(found.expires_at.timestamp(), session.expires_at.timestamp());
    assert!(auth.validate_session("not-a-token").await?.is_none());

    auth.invalidate_session(&token).await?;
    assert!(auth.validate_session(&token).await?.is_none());

    Ok(())
}
