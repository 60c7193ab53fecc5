use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::controllers::admin::AdminController;
use crate::controllers::session::SessionManager;
use crate::controllers::user::UserController;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::core::store::CredentialStore;
use crate::token::TokenCodec;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) codec: Arc<TokenCodec>,
    pub(crate) session: SessionManager,
    pub(crate) admin_controller: AdminController,
    pub(crate) user_controller: UserController,
}

impl AppState {
    pub(crate) fn new(
        pool: PgPool,
        store: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        args: &Args,
    ) -> Result<Self, ConfigError> {
        let codec = Arc::new(codec);

        Ok(AppState {
            session: SessionManager::new(
                store,
                codec.clone(),
                args.store_timeout(),
                args.bcrypt_cost,
            )?,
            codec,
            admin_controller: AdminController::new(pool.clone(), args.bcrypt_cost)?,
            user_controller: UserController::new(pool)?,
        })
    }
}
