//! Participant directory lookups
//!
//! Resolves a conversation counterpart to display metadata (name, photo,
//! contact number) by dispatching on the conversation's cause to the profile
//! table the onboarding services maintain. Lookups are best-effort
//! enrichment: a missing profile or a failed query yields empty fields,
//! never an error to the caller.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::chat::{Cause, ParticipantProfile};

/// Resolve display info for the counterpart of a conversation.
///
/// `counterpart_is_plain_user` selects the plain-user lookup (the
/// counterpart seen from the provider's side); otherwise the cause picks the
/// provider profile (driver, rickshaw vehicle, transporter company).
pub async fn get_participant_info(
    pool: &PgPool,
    cause: Cause,
    counterpart_is_plain_user: bool,
    user_id: Uuid,
) -> ParticipantProfile {
    let result = if counterpart_is_plain_user {
        lookup_user(pool, user_id).await
    } else {
        match cause {
            Cause::Driver | Cause::IndependentCarOwner => lookup_driver(pool, user_id).await,
            Cause::Rickshaw | Cause::ERickshaw => lookup_vehicle(pool, user_id).await,
            Cause::Transporter => lookup_transporter(pool, user_id).await,
        }
    };

    match result {
        Ok(Some(profile)) => profile,
        Ok(None) => ParticipantProfile {
            profile_id: Some(user_id),
            user_id: Some(user_id),
            ..ParticipantProfile::default()
        },
        Err(e) => {
            tracing::error!("[Directory] Error getting participant info: {:?}", e);
            ParticipantProfile {
                profile_id: Some(user_id),
                user_id: Some(user_id),
                ..ParticipantProfile::default()
            }
        }
    }
}

async fn lookup_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ParticipantProfile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT first_name, last_name, image, mobile_number FROM users WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let first: String = r.get("first_name");
        let last: String = r.get("last_name");
        ParticipantProfile {
            name: format!("{first} {last}").trim().to_string(),
            image: r.get::<Option<String>, _>("image").unwrap_or_default(),
            number: r
                .get::<Option<String>, _>("mobile_number")
                .unwrap_or_default(),
            profile_id: Some(user_id),
            user_id: Some(user_id),
        }
    }))
}

async fn lookup_driver(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ParticipantProfile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, full_name, profile_photo, mobile_number FROM drivers WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ParticipantProfile {
        name: r.get::<Option<String>, _>("full_name").unwrap_or_default(),
        image: r
            .get::<Option<String>, _>("profile_photo")
            .unwrap_or_default(),
        number: r
            .get::<Option<String>, _>("mobile_number")
            .unwrap_or_default(),
        profile_id: Some(r.get("id")),
        user_id: Some(user_id),
    }))
}

async fn lookup_vehicle(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ParticipantProfile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, full_name, profile_photo, mobile_number FROM vehicles WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ParticipantProfile {
        name: r.get::<Option<String>, _>("full_name").unwrap_or_default(),
        image: r
            .get::<Option<String>, _>("profile_photo")
            .unwrap_or_default(),
        number: r
            .get::<Option<String>, _>("mobile_number")
            .unwrap_or_default(),
        profile_id: Some(r.get("id")),
        user_id: Some(user_id),
    }))
}

async fn lookup_transporter(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ParticipantProfile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, company_name, photo, mobile_number FROM transporters WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ParticipantProfile {
        name: r.get::<Option<String>, _>("company_name").unwrap_or_default(),
        image: r.get::<Option<String>, _>("photo").unwrap_or_default(),
        number: r
            .get::<Option<String>, _>("mobile_number")
            .unwrap_or_default(),
        profile_id: Some(r.get("id")),
        user_id: Some(user_id),
    }))
}
