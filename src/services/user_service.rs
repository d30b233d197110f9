use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::users::{ProfileResponse, UpdateProfileRequest},
    entity::{
        customers::{Entity as Customers, Model as CustomerModel},
        employees::{Entity as Employees, Model as EmployeeModel},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Address, Customer, Employee, Profile, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolve the profile linked to a user account: customers resolve through
/// `customer_id`, employees and admins through `employee_id`.
pub async fn resolve_profile<C: ConnectionTrait>(
    conn: &C,
    user: &UserModel,
) -> AppResult<Option<Profile>> {
    if user.role == "customer" {
        if let Some(customer_id) = user.customer_id {
            return Ok(Customers::find_by_id(customer_id)
                .one(conn)
                .await?
                .map(|c| Profile::Customer(customer_from_entity(c))));
        }
    } else if user.role == "employee" || user.role == "admin" {
        if let Some(employee_id) = user.employee_id {
            return Ok(Employees::find_by_id(employee_id)
                .one(conn)
                .await?
                .map(|e| Profile::Employee(employee_from_entity(e))));
        }
    }
    Ok(None)
}

pub async fn get_profile(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let user = Users::find_by_id(auth.user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let profile = resolve_profile(&state.orm, &user)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Profile",
        ProfileResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            profile,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let user = Users::find_by_id(auth.user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let profile = resolve_profile(&state.orm, &user)
        .await?
        .ok_or(AppError::NotFound)?;

    let updated = match profile {
        Profile::Customer(customer) => {
            let existing = Customers::find_by_id(customer.id)
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?;
            let mut active = existing.into_active_model();
            if let Some(first_name) = payload.first_name {
                active.first_name = Set(Some(first_name));
            }
            if let Some(last_name) = payload.last_name {
                active.last_name = Set(Some(last_name));
            }
            if let Some(phone) = payload.phone {
                active.phone = Set(Some(phone));
            }
            if let Some(address) = payload.address {
                active.street = Set(Some(address.street));
                active.city = Set(Some(address.city));
                active.state = Set(Some(address.state));
                active.zip_code = Set(Some(address.zip_code));
            }
            active.updated_at = Set(Utc::now().into());
            Profile::Customer(customer_from_entity(active.update(&state.orm).await?))
        }
        Profile::Employee(employee) => {
            let existing = Employees::find_by_id(employee.id)
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?;
            let mut active = existing.into_active_model();
            if let Some(first_name) = payload.first_name {
                active.first_name = Set(Some(first_name));
            }
            if let Some(last_name) = payload.last_name {
                active.last_name = Set(Some(last_name));
            }
            if let Some(phone) = payload.phone {
                active.phone = Set(Some(phone));
            }
            if let Some(address) = payload.address {
                active.street = Set(Some(address.street));
                active.city = Set(Some(address.city));
                active.state = Set(Some(address.state));
                active.zip_code = Set(Some(address.zip_code));
            }
            if let Some(job_title) = payload.job_title {
                active.job_title = Set(job_title);
            }
            active.updated_at = Set(Utc::now().into());
            Profile::Employee(employee_from_entity(active.update(&state.orm).await?))
        }
    };

    Ok(ApiResponse::success(
        "Profile updated",
        ProfileResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            profile: updated,
        },
        Some(Meta::empty()),
    ))
}

/// Delete a user and whatever profile it links to, synchronously and in one
/// transaction. Linked deletion is an explicit operation here, not a database
/// trigger or change-stream listener.
pub async fn delete_user_and_profile(
    state: &AppState,
    admin: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(admin)?;

    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(user_id).one(&txn).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    // Profiles reference the user, so they go first.
    if let Some(customer_id) = user.customer_id {
        Customers::delete_by_id(customer_id).exec(&txn).await?;
    }
    if let Some(employee_id) = user.employee_id {
        Employees::delete_by_id(employee_id).exec(&txn).await?;
    }
    Users::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        role: model.role,
        is_active: model.is_active,
        last_login: model.last_login.map(|dt| dt.with_timezone(&Utc)),
        customer_id: model.customer_id,
        employee_id: model.employee_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        user_id: model.user_id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        address: Address::from_parts(model.street, model.city, model.state, model.zip_code),
        order_count: model.order_count,
        total_spent: model.total_spent,
        last_purchase: model.last_purchase.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn employee_from_entity(model: EmployeeModel) -> Employee {
    Employee {
        id: model.id,
        user_id: model.user_id,
        first_name: model.first_name,
        last_name: model.last_name,
        phone: model.phone,
        address: Address::from_parts(model.street, model.city, model.state, model.zip_code),
        job_title: model.job_title,
        role: model.role,
        hire_date: model.hire_date,
        salary: model.salary,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
