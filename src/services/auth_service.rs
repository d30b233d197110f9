use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        Claims, CreateEmployeeRequest, EmployeeCreatedResponse, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse,
    },
    entity::{
        customers::ActiveModel as CustomerActive,
        employees::ActiveModel as EmployeeActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Profile,
    response::{ApiResponse, Meta},
    services::user_service::{employee_from_entity, resolve_profile, user_from_entity},
    state::AppState,
};

/// Create a user account plus its blank customer profile, cross-linked, in
/// one transaction.
pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let RegisterRequest {
        email,
        password,
        first_name,
        last_name,
    } = payload;

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }

    ensure_email_free(state, &email).await?;

    let password_hash = hash_password(&password)?;

    let txn = state.orm.begin().await?;

    let user_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();

    let user = UserActive {
        id: Set(user_id),
        email: Set(email.to_lowercase()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.clone()),
        last_name: Set(last_name.clone()),
        role: Set("customer".into()),
        is_active: Set(true),
        last_login: Set(None),
        customer_id: Set(None),
        employee_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    CustomerActive {
        id: Set(customer_id),
        user_id: Set(user_id),
        first_name: Set(Some(first_name)),
        last_name: Set(Some(last_name)),
        email: Set(Some(user.email.clone())),
        phone: Set(None),
        street: Set(None),
        city: Set(None),
        state: Set(None),
        zip_code: Set(None),
        order_count: Set(0),
        total_spent: Set(0),
        last_purchase: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut user_active = user.into_active_model();
    user_active.customer_id = Set(Some(customer_id));
    let user = user_active.update(&txn).await?;

    txn.commit().await?;

    let token = issue_token(&user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Registered",
        RegisterResponse {
            token,
            user: user_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.to_lowercase()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Validation("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Validation("Invalid email or password".into()));
    }

    let mut active = user.clone().into_active_model();
    active.last_login = Set(Some(Utc::now().into()));
    let user = active.update(&state.orm).await?;

    let profile = resolve_profile(&state.orm, &user).await?;
    let token = issue_token(&user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: user_from_entity(user),
            profile,
        },
        Some(Meta::empty()),
    ))
}

/// Admin-only: user account plus employee profile, cross-linked, in one
/// transaction.
pub async fn create_employee(
    state: &AppState,
    admin: &AuthUser,
    payload: CreateEmployeeRequest,
) -> AppResult<ApiResponse<EmployeeCreatedResponse>> {
    ensure_admin(admin)?;

    let role = payload.role.unwrap_or_else(|| "employee".to_string());
    if role != "employee" && role != "admin" {
        return Err(AppError::Validation(format!("invalid employee role: {role}")));
    }

    ensure_email_free(state, &payload.email).await?;

    let password_hash = hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;

    let user_id = Uuid::new_v4();
    let employee_id = Uuid::new_v4();
    let address = payload.address;

    let user = UserActive {
        id: Set(user_id),
        email: Set(payload.email.to_lowercase()),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name.clone()),
        last_name: Set(payload.last_name.clone()),
        role: Set(role.clone()),
        is_active: Set(true),
        last_login: Set(None),
        customer_id: Set(None),
        employee_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let employee = EmployeeActive {
        id: Set(employee_id),
        user_id: Set(user_id),
        first_name: Set(Some(payload.first_name)),
        last_name: Set(Some(payload.last_name)),
        phone: Set(payload.phone),
        street: Set(address.as_ref().map(|a| a.street.clone())),
        city: Set(address.as_ref().map(|a| a.city.clone())),
        state: Set(address.as_ref().map(|a| a.state.clone())),
        zip_code: Set(address.as_ref().map(|a| a.zip_code.clone())),
        job_title: Set(payload.job_title),
        role: Set(role),
        hire_date: Set(Utc::now().date_naive()),
        salary: Set(payload.salary),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut user_active = user.into_active_model();
    user_active.employee_id = Set(Some(employee_id));
    let user = user_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "employee_create",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id, "employee_id": employee.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Employee created",
        EmployeeCreatedResponse {
            user: user_from_entity(user),
            profile: Profile::Employee(employee_from_entity(employee)),
        },
        Some(Meta::empty()),
    ))
}

async fn ensure_email_free(state: &AppState, email: &str) -> AppResult<()> {
    let existing = Users::find()
        .filter(UserCol::Email.eq(email.to_lowercase()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }
    Ok(())
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn issue_token(user: &UserModel) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {}", token))
}
