use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::engine::{Engine, EngineError};
use crate::model::{Club, Competition, Receipt};
use crate::observability::{BOOKINGS_TOTAL, BOOKING_DURATION_SECONDS, LOGINS_TOTAL, outcome_label};

/// The collaborator surface: parse requests, resolve identities, invoke the
/// engine, render outcomes. No booking logic lives here.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/competitions", get(competitions))
        .route("/points", get(points))
        .route("/bookings", post(book))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
}

#[derive(Serialize)]
struct LoginReply {
    club: Club,
    competitions: Vec<Competition>,
}

#[derive(Deserialize)]
struct BookingForm {
    club: String,
    competition: String,
    /// Raw text — parsing belongs to the engine.
    places: String,
}

#[derive(Serialize)]
struct BookingReply {
    message: &'static str,
    #[serde(flatten)]
    receipt: Receipt,
}

#[derive(Serialize)]
struct PointsRow {
    name: String,
    points: u32,
}

#[derive(Serialize)]
struct ErrorReply {
    message: &'static str,
}

type Rejection = (StatusCode, Json<ErrorReply>);

fn reject(status: StatusCode, message: &'static str) -> Rejection {
    (status, Json(ErrorReply { message }))
}

async fn login(
    State(engine): State<Arc<Engine>>,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginReply>, Rejection> {
    match engine.club_by_email(&form.email) {
        Some(club) => {
            metrics::counter!(LOGINS_TOTAL, "status" => "ok").increment(1);
            let club = club.read().await.clone();
            let competitions = engine.competitions_snapshot().await;
            Ok(Json(LoginReply { club, competitions }))
        }
        None => {
            metrics::counter!(LOGINS_TOTAL, "status" => "unknown_email").increment(1);
            Err(reject(
                StatusCode::NOT_FOUND,
                "Email not found. Please try again.",
            ))
        }
    }
}

async fn competitions(State(engine): State<Arc<Engine>>) -> Json<Vec<Competition>> {
    Json(engine.competitions_snapshot().await)
}

async fn points(State(engine): State<Arc<Engine>>) -> Json<Vec<PointsRow>> {
    let rows = engine
        .points_board()
        .await
        .into_iter()
        .map(|(name, points)| PointsRow { name, points })
        .collect();
    Json(rows)
}

async fn book(
    State(engine): State<Arc<Engine>>,
    Json(form): Json<BookingForm>,
) -> Result<Json<BookingReply>, Rejection> {
    let start = Instant::now();
    let outcome = engine
        .book_places(&form.club, &form.competition, &form.places)
        .await;
    metrics::histogram!(BOOKING_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
    metrics::counter!(BOOKINGS_TOTAL, "outcome" => outcome_label(&outcome)).increment(1);

    match outcome {
        Ok(receipt) => Ok(Json(BookingReply {
            message: "Great - booking complete!",
            receipt,
        })),
        Err(err) => Err(render_error(err)),
    }
}

/// One fixed user-facing message per error kind.
fn render_error(err: EngineError) -> Rejection {
    match err {
        EngineError::InvalidPlaces(_) => reject(
            StatusCode::BAD_REQUEST,
            "Invalid input for places requested",
        ),
        EngineError::NonPositivePlaces(_) => reject(
            StatusCode::BAD_REQUEST,
            "Number of places requested must be greater than zero",
        ),
        EngineError::CapExceeded { .. } => {
            reject(StatusCode::BAD_REQUEST, "Cannot book more than 12 places")
        }
        EngineError::InsufficientCapacity { .. } => {
            reject(StatusCode::CONFLICT, "Not enough places available")
        }
        EngineError::InsufficientPoints { .. } => {
            reject(StatusCode::CONFLICT, "Not enough points")
        }
        EngineError::UnknownClub(_) | EngineError::UnknownCompetition(_) => {
            reject(StatusCode::NOT_FOUND, "Club or competition not found.")
        }
        EngineError::Ledger(e) => {
            tracing::error!("booking failed at the ledger boundary: {e}");
            reject(
                StatusCode::SERVICE_UNAVAILABLE,
                "Ledger write failed, please retry",
            )
        }
    }
}
