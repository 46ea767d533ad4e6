use std::future::Future;
use std::pin::Pin;

use actix_session::SessionExt;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use serde::Serialize;

use crate::auth::session;
use crate::errors::AppError;
use crate::models::user::{self, User};
use crate::models::workspace::{self, Membership, WorkspaceRole};
use crate::state::AppState;

/// The caller of an authenticated request: who they are, which workspace
/// they are acting in, and their role there.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user: User,
    pub workspace_id: i64,
    pub workspace_name: String,
    pub role: WorkspaceRole,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Any member of the workspace may create and edit its proposals.
    pub fn require_editor(&self) -> Result<(), AppError> {
        match self.role {
            WorkspaceRole::Owner | WorkspaceRole::Admin | WorkspaceRole::Member => Ok(()),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.can_manage() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied("workspace.manage".to_string()))
        }
    }

    /// Resolve the context for `user_id`, preferring `preferred_workspace`
    /// when the user is still a member of it.
    pub async fn resolve(
        state: &AppState,
        user_id: i64,
        preferred_workspace: Option<i64>,
    ) -> Result<(AuthContext, bool), AppError> {
        let user = match state.identities.get(&user_id) {
            Some(cached) => cached,
            None => {
                let fresh = user::find_by_id(&state.pool, user_id)
                    .await?
                    .ok_or(AppError::Unauthorized)?;
                state.identities.set(user_id, fresh.clone(), None);
                fresh
            }
        };

        let preferred = match preferred_workspace {
            Some(ws) => workspace::find_membership(&state.pool, ws, user_id).await?,
            None => None,
        };
        let (membership, fell_back): (Membership, bool) = match preferred {
            Some(m) => (m, false),
            None => {
                let m = workspace::first_membership(&state.pool, user_id)
                    .await?
                    .ok_or_else(|| AppError::PermissionDenied("no workspace".to_string()))?;
                (m, true)
            }
        };

        Ok((
            AuthContext {
                user,
                workspace_id: membership.workspace_id,
                workspace_name: membership.workspace_name,
                role: membership.role,
            },
            fell_back,
        ))
    }
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::Session("Application state missing".to_string()))?;
            let user_id = session::get_user_id(&session).ok_or(AppError::Unauthorized)?;
            let preferred = session::get_workspace_id(&session);

            let (ctx, fell_back) = AuthContext::resolve(&state, user_id, preferred).await?;
            if fell_back {
                session::set_workspace_id(&session, ctx.workspace_id)?;
            }
            Ok(ctx)
        })
    }
}
