use log::info;
use std::sync::Arc;

use crate::api::error;
use crate::configs::RedisCache;
use crate::ENV;

use crate::modules::user::model::{InsertUser, SignInModel, SignUpModel, UserResponse};
use crate::modules::user::repository::UserRepository;
use crate::utils::{hash_password, verify_password, Claims, TypeClaims};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<RedisCache>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<RedisCache>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<UserResponse, error::SystemError> {
        let key = format!("user:{}", id);
        if let Some(cached_user) = self.cache.get::<UserResponse>(&key).await? {
            return Ok(cached_user);
        }
        let user_entity = self.repo.find_by_id(id).await?;
        if let Some(entity) = user_entity {
            let response = UserResponse::from(entity);
            self.cache.set(&key, &response, 3600).await?;
            Ok(response)
        } else {
            Err(error::SystemError::not_found("User not found"))
        }
    }

    pub async fn sign_up(&self, model: SignUpModel) -> Result<i64, error::SystemError> {
        let insert = InsertUser {
            username: model.username,
            email: model.email,
            hash_password: hash_password(&model.password)?,
            display_name: model.display_name,
        };

        let id = self.repo.create(&insert).await?;
        Ok(id)
    }

    pub async fn sign_in(
        &self,
        model: SignInModel,
    ) -> Result<(String, String), error::SystemError> {
        let user = self
            .repo
            .find_by_username(&model.username)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid username or password"))?;

        if !verify_password(&user.hash_password, &model.password)? {
            return Err(error::SystemError::unauthorized("Invalid username or password"));
        }

        let access_token = Claims::new(user.id, ENV.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let jti = uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let refresh_token = Claims::new(user.id, ENV.refresh_token_expiration)
            .with_type(TypeClaims::RefreshToken)
            .with_jti(jti)
            .encode(ENV.jwt_secret.as_ref())?;

        Ok((access_token, refresh_token))
    }

    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<String, error::SystemError> {
        let claims = Claims::decode(refresh_token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::SystemError::unauthorized("Token Invalid or Expired"))?;

        if claims._type != Some(TypeClaims::RefreshToken) {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        if !self.repo.exists(claims.sub).await? {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        let access_token = Claims::new(claims.sub, ENV.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(ENV.jwt_secret.as_ref())?;

        Ok(access_token)
    }
}
