use actix_session::Session;

use crate::errors::AppError;

const USER_ID_KEY: &str = "user_id";
const WORKSPACE_ID_KEY: &str = "workspace_id";

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID_KEY).unwrap_or(None)
}

/// Active workspace chosen by the user, if any. Membership is checked by
/// `AuthContext`, not here.
pub fn get_workspace_id(session: &Session) -> Option<i64> {
    session.get::<i64>(WORKSPACE_ID_KEY).unwrap_or(None)
}

/// Start a fresh session for `user_id`. The session id is renewed to avoid
/// fixation.
pub fn log_in(session: &Session, user_id: i64, workspace_id: Option<i64>) -> Result<(), AppError> {
    session.renew();
    session.insert(USER_ID_KEY, user_id)?;
    if let Some(ws) = workspace_id {
        session.insert(WORKSPACE_ID_KEY, ws)?;
    }
    Ok(())
}

pub fn set_workspace_id(session: &Session, workspace_id: i64) -> Result<(), AppError> {
    session.insert(WORKSPACE_ID_KEY, workspace_id)?;
    Ok(())
}

pub fn log_out(session: &Session) {
    session.purge();
}
