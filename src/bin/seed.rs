use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{internet::en::SafeEmail, lorem::en::Sentence, name::en::Name},
    Fake,
};
use rand::{seq::SliceRandom, Rng};
use sqlx::sqlite::SqlitePoolOptions;

use studiobook::{
    auth::AuthService,
    config::Settings,
    domain::{BookingDraft, BookingStatus, NewBooking, Role, TIME_SLOTS},
    repository::{BookingRepository, SqliteBookingRepository, SqliteUserRepository, UserRepository},
};

/// Create the studio's admin account and, optionally, demo bookings.
#[derive(Parser)]
#[command(name = "seed")]
struct Args {
    /// Overrides the configured database URL.
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long, default_value = "admin@studiobook.local")]
    admin_email: String,

    #[arg(long, default_value = "admin12345")]
    admin_password: String,

    #[arg(long, default_value = "Studio Admin")]
    admin_name: String,

    /// Number of fake bookings to create for a demo client.
    #[arg(long, default_value_t = 0)]
    demo_bookings: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = Settings::new().unwrap_or_default();
    let database_url = args.database_url.unwrap_or(settings.database.url);

    println!("Seeding {}", database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let booking_repo = SqliteBookingRepository::new(db_pool.clone());

    let admin_email = args.admin_email.trim().to_lowercase();
    let admin = match user_repo.find_by_email(&admin_email).await? {
        Some(existing) => {
            println!("Admin {} already exists", existing.email);
            existing
        }
        None => {
            let hash = AuthService::hash_password(&args.admin_password)?;
            let created = user_repo.create(&admin_email, &args.admin_name, &hash).await?;
            println!("Created admin {}", created.email);
            created
        }
    };
    user_repo.grant_role(admin.id, Role::Admin).await?;
    user_repo.grant_role(admin.id, Role::User).await?;

    if args.demo_bookings == 0 {
        return Ok(());
    }

    let client_email: String = SafeEmail().fake();
    let client_name: String = Name().fake();
    let client = user_repo
        .create(&client_email, &client_name, &AuthService::hash_password("client12345")?)
        .await?;
    user_repo.grant_role(client.id, Role::User).await?;

    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut created = 0;

    while created < args.demo_bookings {
        let package_id = *["basic", "standard"].choose(&mut rng).unwrap_or(&"standard");
        let couples = rng.gen_bool(0.25);
        let Some(slot) = TIME_SLOTS.choose(&mut rng) else {
            break;
        };
        let date = today + Duration::days(rng.gen_range(1..60));

        let mut draft = BookingDraft::new(package_id, couples)?;
        draft.select_date(date, today)?;
        // Night slots aren't offered on every package; just draw again.
        if draft.select_time(slot).is_err() {
            continue;
        }
        let Ok(price) = draft.checkout_price() else {
            continue;
        };

        let status = *BookingStatus::ALL.choose(&mut rng).unwrap_or(&BookingStatus::Pending);
        let package = draft.package();

        booking_repo
            .create(NewBooking {
                user_id: client.id,
                client_name: client_name.clone(),
                client_email: client_email.clone(),
                package_id: package.id.to_string(),
                package_name: package.name.to_string(),
                package_price: price,
                price_tier: draft.tier(),
                couples,
                booking_date: date,
                booking_time: slot.to_string(),
                status,
                special_requests: Some(Sentence(3..8).fake()),
                uploaded_images: Vec::new(),
                payment_reference: None,
            })
            .await?;
        created += 1;
    }

    println!("Created {} demo bookings for {}", created, client_email);

    Ok(())
}
