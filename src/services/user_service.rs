// src/services/user_service.rs

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{Profile, Role},
        profile::{normalize_phone, CreateUserPayload, UpdateProfilePayload, UserListQuery},
    },
    services::{
        auth::{hash_password, log_reset_token, normalize_email, AuthService},
        notification_service::NotificationHub,
    },
};

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
const AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];
pub const AVATAR_URL_PREFIX: &str = "/avatars";

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    auth_service: AuthService,
    avatar_dir: PathBuf,
    hub: Arc<NotificationHub>,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        auth_service: AuthService,
        avatar_dir: PathBuf,
        hub: Arc<NotificationHub>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, auth_service, avatar_dir, hub, pool }
    }

    // =========================================================================
    //  PERFIL PRÓPRIO
    // =========================================================================

    pub async fn update_me(&self, user: &Profile, payload: UpdateProfilePayload) -> Result<Profile, AppError> {
        let phone = payload
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());

        self.user_repo
            .update_profile(user.id, payload.full_name.trim(), phone.as_deref(), payload.avatar_url.as_deref())
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Grava a imagem no diretório de avatares e devolve a URL pública.
    pub async fn upload_avatar(&self, user: &Profile, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::InvalidUpload("arquivo vazio".into()));
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(AppError::InvalidUpload("arquivo maior que 5 MB".into()));
        }

        let file_name = avatar_file_name(user.id, original_name)?;
        tokio::fs::create_dir_all(&self.avatar_dir).await?;
        tokio::fs::write(self.avatar_dir.join(&file_name), bytes).await?;

        let url = format!("{AVATAR_URL_PREFIX}/{file_name}");
        self.user_repo.set_avatar(user.id, &url).await?;

        tracing::info!(user_id = %user.id, file = %file_name, "🖼️ Avatar atualizado");
        Ok(url)
    }

    // =========================================================================
    //  ADMINISTRAÇÃO
    // =========================================================================

    pub async fn list_users(&self, query: &UserListQuery) -> Result<Vec<Profile>, AppError> {
        let users = self.user_repo.list_all().await?;
        Ok(users.into_iter().filter(|u| query.matches(u)).collect())
    }

    /// Cria a conta com uma senha aleatória que ninguém conhece e emite um
    /// token de recuperação para o convidado definir a própria senha.
    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<Profile, AppError> {
        let temporary_password = Uuid::new_v4().simple().to_string();
        let hashed_password = hash_password(&temporary_password).await?;

        // Conta e token nascem juntos: sem o token, ninguém conheceria a senha
        let mut tx = self.pool.begin().await?;

        let profile = self
            .user_repo
            .create_user(
                &mut *tx,
                &normalize_email(&payload.email),
                &hashed_password,
                payload.full_name.trim(),
                payload.role.unwrap_or(Role::Salesperson),
            )
            .await?;
        let token = self.auth_service.issue_reset_token(&mut *tx, profile.id).await?;

        tx.commit().await?;

        log_reset_token(profile.id, token);
        tracing::info!(user_id = %profile.id, "👥 Usuário criado pelo administrador");
        Ok(profile)
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Profile, AppError> {
        let profile = self
            .user_repo
            .toggle_active(id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tracing::info!(user_id = %id, active = profile.active, "Status do usuário alterado");
        self.drop_inbox_unless_notified(&profile).await;
        Ok(profile)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Profile, AppError> {
        let profile = self
            .user_repo
            .set_role(id, role)
            .await?
            .ok_or(AppError::UserNotFound)?;
        self.drop_inbox_unless_notified(&profile).await;
        Ok(profile)
    }

    pub async fn delete_user(&self, admin: &Profile, id: Uuid) -> Result<(), AppError> {
        if admin.id == id {
            return Err(AppError::CannotDeleteSelf);
        }
        if !self.user_repo.delete(id).await? {
            return Err(AppError::UserNotFound);
        }
        self.hub.clear(id).await;
        tracing::info!(user_id = %id, by = %admin.id, "Usuário excluído");
        Ok(())
    }

    // Só gestores e administradores ativos recebem notificações
    async fn drop_inbox_unless_notified(&self, profile: &Profile) {
        if !receives_notifications(profile) {
            self.hub.clear(profile.id).await;
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Profile>, AppError> {
        self.user_repo.list_all().await
    }
}

pub fn receives_notifications(profile: &Profile) -> bool {
    profile.active && profile.role.is_privileged()
}

/// Nome do arquivo salvo: `<id do usuário>-<uuid>.<extensão>`.
pub fn avatar_file_name(user_id: Uuid, original_name: &str) -> Result<String, AppError> {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| AVATAR_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| AppError::InvalidUpload(format!("extensão não suportada: {original_name}")))?;

    Ok(format!("{}-{}.{}", user_id, Uuid::new_v4(), extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::tests::profile;

    #[test]
    fn only_active_privileged_users_keep_an_inbox() {
        let mut manager = profile("Ana Silva", "ana@visitlog.com", Role::Manager);
        assert!(receives_notifications(&manager));

        manager.active = false;
        assert!(!receives_notifications(&manager));

        let salesperson = profile("Ricardo Mendes", "ricardo@visitlog.com", Role::Salesperson);
        assert!(!receives_notifications(&salesperson));
    }

    #[test]
    fn avatar_name_keeps_owner_and_extension() {
        let user_id = Uuid::new_v4();
        let name = avatar_file_name(user_id, "Minha Foto.JPG").unwrap();

        assert!(name.starts_with(&format!("{user_id}-")));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn avatar_rejects_unknown_or_missing_extensions() {
        let user_id = Uuid::new_v4();
        assert!(matches!(avatar_file_name(user_id, "script.sh"), Err(AppError::InvalidUpload(_))));
        assert!(matches!(avatar_file_name(user_id, "semextensao"), Err(AppError::InvalidUpload(_))));
    }
}
