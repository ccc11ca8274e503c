/// Startup provisioning
///
/// Creates the bootstrap admin account on first run so a fresh
/// deployment has a way in. Subsequent starts leave the account alone,
/// including any password changes made since.

use sqlx::PgPool;
use tracing::{info, warn};

use taskline_shared::auth::password;
use taskline_shared::models::user::{NewUser, Role, User};

use crate::config::AdminConfig;

/// Ensures the admin account from configuration exists.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminConfig) -> anyhow::Result<()> {
    if User::find_by_email(pool, &admin.email).await?.is_some() {
        info!(email = %admin.email, "Admin account already present");
        return Ok(());
    }

    if admin.password == "admin123" {
        warn!("Admin account uses the default password; set ADMIN_PASSWORD");
    }

    let password_hash = password::hash_password(&admin.password)?;

    let user = User::create(
        pool,
        NewUser {
            name: "Administrator".to_string(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "Bootstrap admin account created");
    Ok(())
}
