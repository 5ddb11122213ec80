use crate::cycle::{parse_date, partner_notification, progress_percent, CycleProfile, PartnerNotification};
use crate::errors::AppError;
use crate::messages::PhaseMessage;
use crate::models::{
    AppData, CreateProfileRequest, CreateProfileResponse, CycleResponse, LinkCodeResponse,
    LinkPartnerRequest, LogMoodRequest, LogPeriodRequest, MoodEntry, PartnerProfile, PeriodEntry,
    Settings, StatusResponse, UpdateProfileRequest, UserProfile,
};
use crate::notify::{notify_now, Notification};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

const LINK_CODE_LEN: usize = 6;

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let data = state.data.lock().await;
    Json(StatusResponse {
        onboarded: data.user.is_some(),
        partner_linked: data.partner.is_some(),
    })
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), AppError> {
    let name = required(&payload.name, "name")?;
    let cycle = CycleProfile::parse(&payload.last_period_date, payload.cycle_length)?;
    reject_future(&state, cycle.last_period_date())?;

    let now = state.clock.now();
    let profile = UserProfile {
        id: new_id(),
        name,
        cycle,
        created_at: now,
        updated_at: now,
    };

    let mut data = state.data.lock().await;
    let link_code = data.link_code.clone().unwrap_or_else(generate_link_code);
    data.user = Some(profile.clone());
    data.link_code = Some(link_code.clone());
    persist_data(&state.data_path, &data).await?;

    info!(cycle_length = cycle.cycle_length(), "user profile created");
    Ok((StatusCode::CREATED, Json(CreateProfileResponse { profile, link_code })))
}

pub async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(user(&data)?.clone()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let now = state.clock.now();
    let mut data = state.data.lock().await;
    let profile = data
        .user
        .as_mut()
        .ok_or_else(|| AppError::not_found("no user profile"))?;

    let name = match payload.name.as_deref() {
        Some(name) => required(name, "name")?,
        None => profile.name.clone(),
    };
    let cycle = match payload.cycle_length {
        Some(cycle_length) => profile.cycle.with_cycle_length(cycle_length)?,
        None => profile.cycle,
    };

    profile.name = name;
    profile.cycle = cycle;
    profile.updated_at = now;
    let updated = profile.clone();

    persist_data(&state.data_path, &data).await?;
    Ok(Json(updated))
}

pub async fn get_cycle(State(state): State<AppState>) -> Result<Json<CycleResponse>, AppError> {
    let data = state.data.lock().await;
    let snapshot = state.predictor().snapshot(&user(&data)?.cycle);

    Ok(Json(CycleResponse {
        phase_info: snapshot.phase.info(),
        progress_percent: progress_percent(snapshot.current_day, snapshot.cycle_length),
        snapshot,
    }))
}

pub async fn list_periods(State(state): State<AppState>) -> Json<Vec<PeriodEntry>> {
    let data = state.data.lock().await;
    Json(data.periods.clone())
}

pub async fn log_period(
    State(state): State<AppState>,
    Json(payload): Json<LogPeriodRequest>,
) -> Result<(StatusCode, Json<PeriodEntry>), AppError> {
    let start_date = parse_date(&payload.start_date)?;
    reject_future(&state, start_date)?;

    let now = state.clock.now();
    let entry = PeriodEntry {
        id: new_id(),
        start_date,
        notes: payload.notes.trim().to_string(),
        logged_at: now,
    };

    let mut data = state.data.lock().await;
    let cycle = data
        .user
        .as_ref()
        .map(|profile| profile.cycle.with_last_period(start_date))
        .transpose()?;
    data.periods.push(entry.clone());
    if let (Some(profile), Some(cycle)) = (data.user.as_mut(), cycle) {
        profile.cycle = cycle;
        profile.updated_at = now;
    }
    persist_data(&state.data_path, &data).await?;

    info!(%start_date, "period logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_moods(State(state): State<AppState>) -> Json<Vec<MoodEntry>> {
    let data = state.data.lock().await;
    Json(data.moods.clone())
}

pub async fn log_mood(
    State(state): State<AppState>,
    Json(payload): Json<LogMoodRequest>,
) -> Result<(StatusCode, Json<MoodEntry>), AppError> {
    let entry = MoodEntry {
        id: new_id(),
        mood: required(&payload.mood, "mood")?,
        notes: payload.notes.trim().to_string(),
        date: state.clock.now(),
    };

    let mut data = state.data.lock().await;
    data.moods.push(entry.clone());
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_link_code(State(state): State<AppState>) -> Result<Json<LinkCodeResponse>, AppError> {
    let mut data = state.data.lock().await;
    let link_code = match data.link_code.clone() {
        Some(code) => code,
        None => {
            let code = generate_link_code();
            data.link_code = Some(code.clone());
            persist_data(&state.data_path, &data).await?;
            code
        }
    };
    Ok(Json(LinkCodeResponse { link_code }))
}

pub async fn get_partner(State(state): State<AppState>) -> Result<Json<PartnerProfile>, AppError> {
    let data = state.data.lock().await;
    data.partner
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::not_found("no partner linked"))
}

pub async fn link_partner(
    State(state): State<AppState>,
    Json(payload): Json<LinkPartnerRequest>,
) -> Result<(StatusCode, Json<PartnerProfile>), AppError> {
    let name = required(&payload.name, "name")?;
    let link_code = required(&payload.link_code, "link_code")?;

    let mut data = state.data.lock().await;
    let matches = data
        .link_code
        .as_deref()
        .is_some_and(|stored| stored.eq_ignore_ascii_case(&link_code));
    if !matches {
        return Err(AppError::bad_request("invalid link code"));
    }

    let partner = PartnerProfile {
        id: new_id(),
        name,
        link_code: link_code.to_ascii_uppercase(),
        linked_at: state.clock.now(),
        notifications_enabled: true,
    };
    data.partner = Some(partner.clone());
    persist_data(&state.data_path, &data).await?;

    info!("partner linked");
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn get_partner_notification(
    State(state): State<AppState>,
) -> Result<Json<PartnerNotification>, AppError> {
    let data = state.data.lock().await;
    let snapshot = state.predictor().snapshot(&user(&data)?.cycle);
    Ok(Json(partner_notification(&snapshot)))
}

pub async fn send_notification(State(state): State<AppState>) -> Result<Json<Notification>, AppError> {
    notify_now(&state)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("no user profile"))
}

pub async fn next_message(State(state): State<AppState>) -> Result<Json<PhaseMessage>, AppError> {
    let mut data = state.data.lock().await;
    let phase = state.predictor().snapshot(&user(&data)?.cycle).phase;

    let message = state
        .messages
        .next_message(phase, &mut data.rotation)
        .ok_or_else(|| AppError::not_found(format!("no messages for phase {}", phase.key())))?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(message))
}

pub async fn reset_rotation(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    data.rotation.reset(None);
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let data = state.data.lock().await;
    Json(data.settings.clone())
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    let mut data = state.data.lock().await;
    data.settings = settings.clone();
    persist_data(&state.data_path, &data).await?;
    Ok(Json(settings))
}

pub async fn clear_data(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    *data = AppData::default();
    persist_data(&state.data_path, &data).await?;
    info!("all data cleared");
    Ok(StatusCode::NO_CONTENT)
}

fn user(data: &AppData) -> Result<&UserProfile, AppError> {
    data.user
        .as_ref()
        .ok_or_else(|| AppError::not_found("no user profile"))
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

// Future start dates would be counted backwards by the predictor.
fn reject_future(state: &AppState, date: NaiveDate) -> Result<(), AppError> {
    if date > state.clock.today() {
        return Err(AppError::bad_request("period start date cannot be in the future"));
    }
    Ok(())
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn generate_link_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(LINK_CODE_LEN);
    code.to_ascii_uppercase()
}
