use crate::config::AppConfig;
use crate::services::user_service::UserService;
use tracing::info;

/// Creates the bootstrap account from configuration if it does not exist yet.
pub async fn seed_initial_user(users: &UserService, config: &AppConfig) -> anyhow::Result<()> {
    let (Some(login), Some(password)) = (
        config.default_user_login.as_deref(),
        config.default_user_password.as_deref(),
    ) else {
        return Ok(());
    };

    if users.user_exists(login).await? {
        info!("🌱 Bootstrap user {} already present", login);
        return Ok(());
    }

    users.create_user(login, password).await?;
    info!("🌱 Bootstrap user {} created", login);
    Ok(())
}
