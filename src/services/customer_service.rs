use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::customers::{CustomerList, CustomerWithAccount, UpdateCustomerRequest},
    entity::{
        customers::{Column as CustomerCol, Entity as Customers},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::user_service::{customer_from_entity, user_from_entity},
    state::AppState,
};

/// Admin view: customers joined with their account records.
pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Customers::find()
        .order_by_asc(CustomerCol::LastName)
        .order_by_asc(CustomerCol::FirstName);

    let total = finder.clone().count(&state.orm).await? as i64;

    let customers = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut user_ids: Vec<Uuid> = customers.iter().map(|c| c.user_id).collect();
    user_ids.sort();
    user_ids.dedup();
    let users: HashMap<Uuid, UserModel> = Users::find()
        .filter(crate::entity::users::Column::Id.is_in(user_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let items = customers
        .into_iter()
        .map(|customer| {
            let account = users.get(&customer.user_id).cloned().map(user_from_entity);
            CustomerWithAccount {
                customer: customer_from_entity(customer),
                account,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(meta),
    ))
}

pub async fn update_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<CustomerWithAccount>> {
    ensure_admin(user)?;

    let existing = Customers::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

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
    let customer = active.update(&state.orm).await?;

    let account = Users::find_by_id(customer.user_id)
        .one(&state.orm)
        .await?
        .map(user_from_entity);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "customer_update",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": customer.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Customer updated",
        CustomerWithAccount {
            customer: customer_from_entity(customer),
            account,
        },
        Some(Meta::empty()),
    ))
}

/// Deleting a customer also deletes its linked user account, synchronously in
/// one transaction.
pub async fn delete_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let customer = Customers::find_by_id(id).one(&txn).await?;
    let customer = match customer {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    // The customer row references the user, so it goes first.
    let user_id = customer.user_id;
    Customers::delete_by_id(id).exec(&txn).await?;
    Users::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "customer_delete",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": id, "user_id": user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Customer deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
