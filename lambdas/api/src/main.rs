use aws_config::BehaviorVersion;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use domain::{
    dispenses::{
        self,
        cqrs::DynamoEventStore,
        inputs::{
            parse_optional_day, CreateDispenseInput, ListDispensesParams, PayDispenseInput,
            PrefillParams, UpdateDispenseInput,
        },
        Dispensary, DispenseFilter, PrefillTarget,
    },
    Config,
};
use std::sync::Arc;

mod auth;
mod error;
mod validation;

use auth::{ActingUser, DISPENSERS, FRONT_DESK};
use error::{ApiError, ApiResponse};
use validation::ValidJson;

#[derive(Clone)]
struct AppState {
    dispensary: Arc<Dispensary<DynamoEventStore>>,
}

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env();
    let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws);

    let state = AppState {
        dispensary: dispenses::cqrs::init(dynamodb_client, &config),
    };

    let app = Router::new()
        .route("/dispenses", get(list_dispenses).post(create_dispense))
        .route("/dispenses/prefill", get(prefill_dispense))
        .route("/dispenses/:id", get(get_dispense).put(update_dispense))
        .route("/dispenses/:id/pay", post(pay_dispense))
        .with_state(state);

    let app = tower::ServiceBuilder::new()
        .layer(axum_aws_lambda::LambdaLayer::default())
        .service(app);

    lambda_http::run(app).await?;
    Ok(())
}

// List dispenses for a patient or a day's token
async fn list_dispenses(
    user: ActingUser,
    State(state): State<AppState>,
    Query(params): Query<ListDispensesParams>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(FRONT_DESK)?;

    let day = parse_optional_day(params.date.as_deref())?;
    let filter = DispenseFilter::new(params.patient_id, day, params.token)?;
    let dispenses = state.dispensary.list(&filter).await?;

    Ok(ApiResponse::ok(dispenses))
}

// Get dispense
async fn get_dispense(
    user: ActingUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(FRONT_DESK)?;

    let dispense = state.dispensary.get(&id).await?;
    Ok(ApiResponse::ok(dispense))
}

// Create dispense
async fn create_dispense(
    user: ActingUser,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateDispenseInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(DISPENSERS)?;

    let dispense = state.dispensary.create(input, &user.id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(dispense, "Dispense recorded"),
    ))
}

// Replace items and/or tax
async fn update_dispense(
    user: ActingUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<UpdateDispenseInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(DISPENSERS)?;

    let dispense = state.dispensary.update(&id, input).await?;
    Ok(ApiResponse::with_message(dispense, "Dispense updated"))
}

// Record a payment
async fn pay_dispense(
    user: ActingUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<PayDispenseInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(FRONT_DESK)?;

    let dispense = state.dispensary.pay(&id, input).await?;
    Ok(ApiResponse::with_message(dispense, "Payment recorded"))
}

// Draft items from the latest prescription
async fn prefill_dispense(
    user: ActingUser,
    State(state): State<AppState>,
    Query(params): Query<PrefillParams>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(FRONT_DESK)?;

    let target = PrefillTarget::from_parts(params.appointment_id, params.patient_id)?;
    let items = state.dispensary.prefill(&target).await?;

    Ok(ApiResponse::ok(items))
}
