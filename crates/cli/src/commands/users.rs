//! Back-office user commands.
//!
//! These go through the auth provider's admin surface, so the Supabase
//! backend needs `SUPABASE_SERVICE_ROLE_KEY`.

use std::path::Path;

use marys_fashion_core::{NewUser, UserFilters, UserId};
use marys_fashion_storefront::services::UserService;

use super::{CliError, Context, ensure, print_json, read_json, require};

pub async fn list(ctx: &Context, filters: &UserFilters) -> Result<(), CliError> {
    let users = UserService::new(ctx.gateways.auth.clone())
        .list(filters)
        .await;
    tracing::info!("{} user(s)", users.len());
    print_json(&users)
}

pub async fn create(ctx: &Context, file: &Path) -> Result<(), CliError> {
    let payload: NewUser = read_json(file)?;
    let created = UserService::new(ctx.gateways.auth.clone())
        .create(&payload)
        .await;
    print_json(&require(created, "user create")?)
}

pub async fn set_active(ctx: &Context, id: UserId, active: bool) -> Result<(), CliError> {
    let users = UserService::new(ctx.gateways.auth.clone());
    let ok = if active {
        users.activate(id).await
    } else {
        users.deactivate(id).await
    };
    ensure(ok, if active { "user activate" } else { "user deactivate" })?;
    tracing::info!("User {} is now {}", id, if active { "active" } else { "inactive" });
    Ok(())
}

pub async fn delete(ctx: &Context, id: UserId) -> Result<(), CliError> {
    let deleted = UserService::new(ctx.gateways.auth.clone())
        .delete(id)
        .await;
    ensure(deleted, "user delete")?;
    tracing::info!("Deleted user {}", id);
    Ok(())
}
